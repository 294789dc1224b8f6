//! Parsing external field dictionaries.
//!
//! Three layouts are accepted, all carrying the same four keys:
//!
//! ```text
//! CSV   field_name,type,format,description
//!       ssn,numeric,999-99-9999,Social Security Number
//!
//! YAML  - field_name: ssn
//! JSON    type: numeric
//!         format: 999-99-9999
//!
//! YAML  sensitive_fields:
//! JSON    ssn: { type: numeric, format: 999-99-9999 }
//! ```
//!
//! `field_name` and `type` are required; `format` and `description` may be
//! absent or blank.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::{normalize_field_name, CatalogWarning, FieldCatalog, FieldCategory, FieldConfig};
use crate::{CatalogError, FormatPattern};

/// Result of a successful parse: the catalog and what was wrong with it.
pub type ParsedCatalog = (FieldCatalog, Vec<CatalogWarning>);

/// On-disk layout of an external dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    /// Comma-separated with a header row.
    Csv,
    /// YAML list or `sensitive_fields` map.
    Yaml,
    /// JSON list or `sensitive_fields` map.
    Json,
}

impl CatalogFormat {
    /// Pick the layout from a file name or object key extension.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownFormat`] for any other extension.
    pub fn from_path(path: &str) -> Result<Self, CatalogError> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(CatalogFormat::Csv),
            Some("yaml") | Some("yml") => Ok(CatalogFormat::Yaml),
            Some("json") => Ok(CatalogFormat::Json),
            _ => Err(CatalogError::UnknownFormat(path.to_owned())),
        }
    }
}

/// One dictionary row before validation.
#[derive(Debug, Clone, Deserialize)]
struct RawEntry {
    field_name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, deserialize_with = "scalar_text")]
    format: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawDefinition {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, deserialize_with = "scalar_text")]
    format: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    description: Option<String>,
}

/// YAML reads `format: 99999999` as an integer; accept any scalar as text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Bool(bool),
}

fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Scalar> = Option::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        Scalar::Text(s) => s,
        Scalar::Integer(n) => n.to_string(),
        Scalar::Unsigned(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCatalog {
    List(Vec<RawEntry>),
    Dictionary {
        sensitive_fields: BTreeMap<String, RawDefinition>,
    },
}

impl RawCatalog {
    fn into_entries(self) -> Vec<RawEntry> {
        match self {
            RawCatalog::List(entries) => entries,
            RawCatalog::Dictionary { sensitive_fields } => sensitive_fields
                .into_iter()
                .map(|(field_name, def)| RawEntry {
                    field_name,
                    kind: def.kind,
                    format: def.format,
                    description: def.description,
                })
                .collect(),
        }
    }
}

impl FieldCatalog {
    /// Parse `bytes` in the given layout.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the source is malformed or lacks a
    /// required column.
    pub fn parse(format: CatalogFormat, bytes: &[u8]) -> Result<ParsedCatalog, CatalogError> {
        match format {
            CatalogFormat::Csv => Self::from_csv_reader(bytes),
            CatalogFormat::Yaml => Self::from_yaml_slice(bytes),
            CatalogFormat::Json => Self::from_json_slice(bytes),
        }
    }

    /// Parse a CSV dictionary with a header row. Header names are matched
    /// case-insensitively; column order is free.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<ParsedCatalog, CatalogError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(normalize_field_name)
            .collect();
        let column = |name: &str| headers.iter().position(|h| h == name);
        let name_idx = column("field_name").ok_or(CatalogError::MissingColumn("field_name"))?;
        let type_idx = column("type").ok_or(CatalogError::MissingColumn("type"))?;
        let format_idx = column("format");
        let description_idx = column("description");

        let mut entries = Vec::new();
        for row in reader.records() {
            let row = row?;
            let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(str::to_owned);
            entries.push(RawEntry {
                field_name: cell(Some(name_idx)).unwrap_or_default(),
                kind: cell(Some(type_idx)).unwrap_or_default(),
                format: cell(format_idx),
                description: cell(description_idx),
            });
        }
        Ok(build(entries))
    }

    /// Parse a YAML dictionary.
    pub fn from_yaml_slice(bytes: &[u8]) -> Result<ParsedCatalog, CatalogError> {
        let raw: RawCatalog = serde_yaml::from_slice(bytes)?;
        Ok(build(raw.into_entries()))
    }

    /// Parse a JSON dictionary.
    pub fn from_json_slice(bytes: &[u8]) -> Result<ParsedCatalog, CatalogError> {
        let raw: RawCatalog = serde_json::from_slice(bytes)?;
        Ok(build(raw.into_entries()))
    }

    /// Parse `bytes` fetched from `source`, choosing the layout from its
    /// extension. Any failure yields the builtin catalog plus a
    /// [`CatalogWarning::LoadFailure`].
    pub fn load_or_builtin(source: &str, bytes: &[u8]) -> ParsedCatalog {
        let parsed = CatalogFormat::from_path(source).and_then(|format| Self::parse(format, bytes));
        Self::or_builtin(source, parsed)
    }

    /// Apply the builtin fallback to an already attempted load.
    pub fn or_builtin(source: &str, parsed: Result<ParsedCatalog, CatalogError>) -> ParsedCatalog {
        match parsed {
            Ok(parsed) => parsed,
            Err(e) => (
                FieldCatalog::builtin(),
                vec![CatalogWarning::LoadFailure {
                    source: source.to_owned(),
                    reason: e.to_string(),
                }],
            ),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn build(entries: Vec<RawEntry>) -> ParsedCatalog {
    let mut catalog = FieldCatalog::new();
    let mut warnings = Vec::new();

    for entry in entries {
        let field = normalize_field_name(&entry.field_name);
        if field.is_empty() {
            continue;
        }

        let category = match FieldCategory::parse(&entry.kind) {
            Some(c) => c,
            None => {
                warnings.push(CatalogWarning::UnknownType {
                    field: field.clone(),
                    value: entry.kind.trim().to_owned(),
                });
                FieldCategory::Passthrough
            }
        };

        let format = match non_blank(entry.format) {
            Some(text) => match FormatPattern::parse(&text) {
                Some(p) if p.digit_slots() > 0 => Some(p),
                _ => {
                    warnings.push(CatalogWarning::InvalidFormat {
                        field: field.clone(),
                        format: text,
                    });
                    None
                }
            },
            None => None,
        };

        let config = FieldConfig {
            category,
            format,
            description: non_blank(entry.description),
        };
        if catalog.insert(&field, config).is_some() {
            warnings.push(CatalogWarning::DuplicateField { field });
        }
    }

    (catalog, warnings)
}
