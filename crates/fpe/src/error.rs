//! Error types for the format-preserving cipher core.

use std::fmt;

use thiserror::Error;

/// Errors produced by the ciphers for a single value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FpeError {
    /// Key material is empty or otherwise unusable.
    #[error("invalid key: key material must not be empty")]
    InvalidKey,

    /// The value does not fit the character class declared for its field.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Human-readable reason. Never contains the offending value.
        reason: String,
    },

    /// A Feistel cipher needs at least one round.
    #[error("invalid round count: at least one round is required")]
    InvalidRounds,
}

impl FpeError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        FpeError::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Errors raised while parsing an external field catalog.
///
/// These never abort a session: the loading boundary turns them into a
/// [`crate::CatalogWarning::LoadFailure`] and falls back to the builtin catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A required column (`field_name` or `type`) is absent.
    #[error("catalog is missing required column `{0}`")]
    MissingColumn(&'static str),

    /// The CSV source could not be read.
    #[error("malformed CSV catalog: {0}")]
    Csv(#[from] csv::Error),

    /// The YAML source could not be parsed.
    #[error("malformed YAML catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The JSON source could not be parsed.
    #[error("malformed JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    /// The source name has no recognised catalog extension.
    #[error("unrecognised catalog format for `{0}` (expected .csv, .yaml, .yml or .json)")]
    UnknownFormat(String),
}

/// Errors reading or writing a CSV dataset as a [`crate::Table`].
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The CSV source is malformed or could not be read.
    #[error("malformed CSV dataset: {0}")]
    Csv(#[from] csv::Error),

    /// Flushing the output failed.
    #[error("failed to write CSV dataset: {0}")]
    Io(#[from] std::io::Error),
}

/// A single field that could not be transformed.
///
/// Carries the field name and, for batch operations, the zero-based row index.
/// The failed cell keeps its input value in the transformed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    /// Field (column) name as it appeared in the input.
    pub field: String,
    /// Zero-based row index for batch operations.
    pub row: Option<usize>,
    /// The cipher-level error.
    pub error: FpeError,
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "field `{}` (row {row}): {}", self.field, self.error),
            None => write!(f, "field `{}`: {}", self.field, self.error),
        }
    }
}

impl std::error::Error for FieldFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_key() {
        assert_eq!(
            FpeError::InvalidKey.to_string(),
            "invalid key: key material must not be empty"
        );
    }

    #[test]
    fn display_invalid_input_includes_reason() {
        let e = FpeError::invalid_input("expected only digits");
        assert!(e.to_string().contains("expected only digits"));
    }

    #[test]
    fn field_failure_display_with_row() {
        let f = FieldFailure {
            field: "ssn".into(),
            row: Some(3),
            error: FpeError::invalid_input("bad"),
        };
        assert_eq!(f.to_string(), "field `ssn` (row 3): invalid input: bad");
    }

    #[test]
    fn field_failure_display_without_row() {
        let f = FieldFailure {
            field: "phone".into(),
            row: None,
            error: FpeError::InvalidKey,
        };
        assert!(f.to_string().starts_with("field `phone`: "));
    }

    #[test]
    fn missing_column_names_the_column() {
        let e = CatalogError::MissingColumn("type");
        assert!(e.to_string().contains("`type`"));
    }
}
