//! CSV datasets as [`Table`]s.
//!
//! The first CSV row is the header. Empty cells read as `None` and `None`
//! writes back as an empty cell, so a dataset survives a read/write cycle
//! unchanged. Rows may be shorter or longer than the header.

use std::io::{Read, Write};

use crate::error::DatasetError;
use crate::Table;

impl Table {
    /// Read a headed CSV dataset.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Csv`] if the input is not valid CSV or not
    /// UTF-8.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let columns = reader.headers()?.iter().map(str::to_owned).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|cell| (!cell.is_empty()).then(|| cell.to_owned()))
                    .collect(),
            );
        }

        Ok(Self { columns, rows })
    }

    /// Write the table as headed CSV.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the underlying writer fails.
    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<(), DatasetError> {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);

        if !self.columns.is_empty() {
            writer.write_record(&self.columns)?;
        }
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cells_read_as_none() {
        let table = Table::from_csv_reader("ssn,name\n123-45-6789,\n,Bob\n".as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["ssn", "name"]);
        assert_eq!(
            table.rows,
            vec![
                vec![Some("123-45-6789".to_owned()), None],
                vec![None, Some("Bob".to_owned())],
            ]
        );
    }

    #[test]
    fn quoted_cells_survive_a_write() {
        let input = "address,phone\n\"12 Main St, Apt 4\",(555) 123-4567\n";
        let table = Table::from_csv_reader(input.as_bytes()).unwrap();
        assert_eq!(table.rows[0][0].as_deref(), Some("12 Main St, Apt 4"));

        let mut out = Vec::new();
        table.to_csv_writer(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), input);
    }

    #[test]
    fn ragged_rows_are_kept() {
        let table = Table::from_csv_reader("a,b\n1\n1,2,3\n".as_bytes()).unwrap();
        assert_eq!(table.rows[0].len(), 1);
        assert_eq!(table.rows[1].len(), 3);
    }

    #[test]
    fn none_writes_as_empty_cell() {
        let table = Table {
            columns: vec!["ssn".into(), "name".into()],
            rows: vec![vec![None, Some("Jane".into())]],
        };
        let mut out = Vec::new();
        table.to_csv_writer(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ssn,name\n,Jane\n");
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = Table::from_csv_reader(&b"ssn\n\xff\xfe\n"[..]).unwrap_err();
        assert!(matches!(err, DatasetError::Csv(_)));
    }
}
