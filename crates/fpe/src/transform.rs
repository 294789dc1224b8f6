//! Record and table transformation.
//!
//! A [`Transformer`] binds one key and one [`FieldCatalog`] and applies the
//! matching cipher to every classified field of a record, a batch of
//! records, or a column-oriented [`Table`]. Passthrough fields, `None` values
//! and empty strings are copied unchanged.
//!
//! Failures are per cell: the cell keeps its input value and a
//! [`FieldFailure`] is added to the [`TransformReport`]. With
//! [`TransformOptions::strict`] the first failure aborts the call instead.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::{
    is_mixable, AlphanumericCipher, FieldCatalog, FieldCategory, FieldConfig, FieldFailure,
    FpeError, Key, NumericCipher, RoundStrategy, DEFAULT_ROUNDS,
};

/// A flat record: field name → value. `None` models SQL/JSON null.
pub type Record = BTreeMap<String, Option<String>>;

/// Column-oriented table: one header row, any number of data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column names, classified once per call.
    pub columns: Vec<String>,
    /// Cells in column order. Rows shorter than `columns` are allowed.
    pub rows: Vec<Vec<Option<String>>>,
}

/// Per-deployment cipher settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    /// Feistel rounds for numeric fields.
    pub rounds: u32,
    /// Round function for numeric fields.
    pub strategy: RoundStrategy,
    /// Check numeric values against the field's format (or "digits only"
    /// when none is declared) and fail mismatches with `InvalidInput`.
    pub validate: bool,
    /// Abort the whole call on the first failed cell.
    pub strict: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            strategy: RoundStrategy::default(),
            validate: false,
            strict: false,
        }
    }
}

/// A numeric value with exactly one digit, returned unchanged because the
/// Feistel network has nothing to mix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortValue {
    /// Field name as it appeared in the input.
    pub field: String,
    /// Zero-based row index for batch operations.
    pub row: Option<usize>,
}

/// Everything a transform call wants the caller to know about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    /// Cells that could not be transformed (kept as input).
    pub failures: Vec<FieldFailure>,
    /// Numeric cells that passed through unmixed.
    pub short_values: Vec<ShortValue>,
}

impl TransformReport {
    /// `true` if there is nothing to report.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.short_values.is_empty()
    }
}

/// Output of a transform call together with its report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed<T> {
    /// The transformed record(s) or table.
    pub output: T,
    /// Failures and notices collected along the way.
    pub report: TransformReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Encrypt,
    Decrypt,
}

/// Stateless transform engine for one key and one catalog.
pub struct Transformer {
    numeric: NumericCipher,
    alphanumeric: AlphanumericCipher,
    catalog: Arc<FieldCatalog>,
    options: TransformOptions,
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("options", &self.options)
            .field("catalog_fields", &self.catalog.len())
            .finish_non_exhaustive()
    }
}

impl Transformer {
    /// Build the cipher schedules for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`FpeError::InvalidRounds`] for zero rounds and
    /// [`FpeError::InvalidKey`] for unusable key material.
    pub fn new(
        key: &Key,
        catalog: Arc<FieldCatalog>,
        options: TransformOptions,
    ) -> Result<Self, FpeError> {
        Ok(Self {
            numeric: NumericCipher::new(key, options.rounds, options.strategy)?,
            alphanumeric: AlphanumericCipher::new(key)?,
            catalog,
            options,
        })
    }

    /// The catalog this engine classifies with.
    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    /// The options this engine was built with.
    pub fn options(&self) -> TransformOptions {
        self.options
    }

    /// Encrypt one value according to `config`.
    pub fn encrypt_value(&self, config: &FieldConfig, value: &str) -> Result<String, FpeError> {
        self.apply(Direction::Encrypt, config, value)
    }

    /// Decrypt one value according to `config`.
    pub fn decrypt_value(&self, config: &FieldConfig, value: &str) -> Result<String, FpeError> {
        self.apply(Direction::Decrypt, config, value)
    }

    /// Encrypt every classified field of `record`.
    ///
    /// # Errors
    ///
    /// Only in strict mode: the first [`FieldFailure`].
    pub fn encrypt_record(&self, record: &Record) -> Result<Transformed<Record>, FieldFailure> {
        self.record(Direction::Encrypt, record, None)
    }

    /// Inverse of [`Transformer::encrypt_record`].
    pub fn decrypt_record(&self, record: &Record) -> Result<Transformed<Record>, FieldFailure> {
        self.record(Direction::Decrypt, record, None)
    }

    /// Encrypt a batch of records; failures carry their row index.
    pub fn encrypt_records(
        &self,
        records: &[Record],
    ) -> Result<Transformed<Vec<Record>>, FieldFailure> {
        self.records(Direction::Encrypt, records)
    }

    /// Inverse of [`Transformer::encrypt_records`].
    pub fn decrypt_records(
        &self,
        records: &[Record],
    ) -> Result<Transformed<Vec<Record>>, FieldFailure> {
        self.records(Direction::Decrypt, records)
    }

    /// Encrypt every classified column of `table`.
    pub fn encrypt_table(&self, table: &Table) -> Result<Transformed<Table>, FieldFailure> {
        self.table(Direction::Encrypt, table)
    }

    /// Inverse of [`Transformer::encrypt_table`].
    pub fn decrypt_table(&self, table: &Table) -> Result<Transformed<Table>, FieldFailure> {
        self.table(Direction::Decrypt, table)
    }

    fn apply(
        &self,
        direction: Direction,
        config: &FieldConfig,
        value: &str,
    ) -> Result<String, FpeError> {
        let format = config.format.as_ref();
        match (config.category, direction, self.options.validate) {
            (FieldCategory::Numeric, Direction::Encrypt, true) => {
                self.numeric.encrypt_strict(value, format)
            }
            (FieldCategory::Numeric, Direction::Decrypt, true) => {
                self.numeric.decrypt_strict(value, format)
            }
            (FieldCategory::Numeric, Direction::Encrypt, false) => self.numeric.encrypt(value),
            (FieldCategory::Numeric, Direction::Decrypt, false) => self.numeric.decrypt(value),
            (FieldCategory::Alphanumeric, Direction::Encrypt, _) => {
                Ok(self.alphanumeric.encrypt(value))
            }
            (FieldCategory::Alphanumeric, Direction::Decrypt, _) => {
                Ok(self.alphanumeric.decrypt(value))
            }
            (FieldCategory::Passthrough, _, _) => Ok(value.to_owned()),
        }
    }

    fn cell(
        &self,
        direction: Direction,
        config: &FieldConfig,
        field: &str,
        row: Option<usize>,
        value: &Option<String>,
        report: &mut TransformReport,
    ) -> Result<Option<String>, FieldFailure> {
        let text = match value.as_deref() {
            Some(text) if !text.is_empty() && config.is_sensitive() => text,
            _ => return Ok(value.clone()),
        };

        match self.apply(direction, config, text) {
            Ok(out) => {
                if config.category == FieldCategory::Numeric && has_single_digit(text) {
                    report.short_values.push(ShortValue {
                        field: field.to_owned(),
                        row,
                    });
                }
                Ok(Some(out))
            }
            Err(error) => {
                let failure = FieldFailure {
                    field: field.to_owned(),
                    row,
                    error,
                };
                if self.options.strict {
                    return Err(failure);
                }
                report.failures.push(failure);
                Ok(value.clone())
            }
        }
    }

    fn transform_record(
        &self,
        direction: Direction,
        record: &Record,
        row: Option<usize>,
        report: &mut TransformReport,
    ) -> Result<Record, FieldFailure> {
        record
            .iter()
            .map(|(field, value)| {
                let config = self.catalog.classify(field);
                let out = self.cell(direction, config, field, row, value, report)?;
                Ok((field.clone(), out))
            })
            .collect()
    }

    fn record(
        &self,
        direction: Direction,
        record: &Record,
        row: Option<usize>,
    ) -> Result<Transformed<Record>, FieldFailure> {
        let mut report = TransformReport::default();
        let output = self.transform_record(direction, record, row, &mut report)?;
        Ok(Transformed { output, report })
    }

    fn records(
        &self,
        direction: Direction,
        records: &[Record],
    ) -> Result<Transformed<Vec<Record>>, FieldFailure> {
        let mut report = TransformReport::default();
        let output = records
            .iter()
            .enumerate()
            .map(|(i, record)| self.transform_record(direction, record, Some(i), &mut report))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Transformed { output, report })
    }

    fn table(
        &self,
        direction: Direction,
        table: &Table,
    ) -> Result<Transformed<Table>, FieldFailure> {
        let configs: Vec<&FieldConfig> = table
            .columns
            .iter()
            .map(|c| self.catalog.classify(c))
            .collect();

        let mut report = TransformReport::default();
        let mut rows = Vec::with_capacity(table.rows.len());
        for (i, row) in table.rows.iter().enumerate() {
            let mut out = Vec::with_capacity(row.len());
            for (j, value) in row.iter().enumerate() {
                let cell = match (table.columns.get(j), configs.get(j)) {
                    (Some(field), Some(config)) => {
                        self.cell(direction, config, field, Some(i), value, &mut report)?
                    }
                    _ => value.clone(),
                };
                out.push(cell);
            }
            rows.push(out);
        }

        Ok(Transformed {
            output: Table {
                columns: table.columns.clone(),
                rows,
            },
            report,
        })
    }
}

fn has_single_digit(value: &str) -> bool {
    value.bytes().any(|b| b.is_ascii_digit()) && !is_mixable(value)
}
