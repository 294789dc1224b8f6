//! Field classification: which cipher (if any) applies to a named field.
//!
//! # Responsibilities
//!
//! - Map a normalised field name (trimmed, lower-cased) to a [`FieldConfig`].
//! - Provide the builtin dictionary used when no external one is supplied or
//!   the supplied one cannot be parsed.
//! - Parse external dictionaries (CSV, YAML, JSON); see [`loader`].
//!
//! # Module invariants
//!
//! - Every field name classifies to exactly one config; unknown names are
//!   [`FieldCategory::Passthrough`].
//! - Loading never fails the caller: problems are returned as
//!   [`CatalogWarning`]s alongside a usable catalog.

pub mod loader;

pub use loader::CatalogFormat;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::FormatPattern;

/// How the transform engine treats a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCategory {
    /// Digits go through the Feistel cipher.
    Numeric,
    /// Letters and digits go through the positional cipher.
    Alphanumeric,
    /// Left untouched.
    Passthrough,
}

impl FieldCategory {
    /// Parse a catalog `type` cell. Returns `None` for unrecognised text.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "numeric" => Some(FieldCategory::Numeric),
            "alphanumeric" => Some(FieldCategory::Alphanumeric),
            "passthrough" => Some(FieldCategory::Passthrough),
            _ => None,
        }
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldCategory::Numeric => "numeric",
            FieldCategory::Alphanumeric => "alphanumeric",
            FieldCategory::Passthrough => "passthrough",
        })
    }
}

/// Classification of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Cipher selection.
    pub category: FieldCategory,
    /// Expected separator skeleton, used by strict mode.
    pub format: Option<FormatPattern>,
    /// Free text; ignored by the ciphers.
    pub description: Option<String>,
}

static PASSTHROUGH: FieldConfig = FieldConfig {
    category: FieldCategory::Passthrough,
    format: None,
    description: None,
};

impl FieldConfig {
    /// Numeric field with an optional format template.
    pub fn numeric(format: Option<&str>, description: Option<&str>) -> Self {
        Self {
            category: FieldCategory::Numeric,
            format: format.and_then(FormatPattern::parse),
            description: description.map(str::to_owned),
        }
    }

    /// Alphanumeric field.
    pub fn alphanumeric(description: Option<&str>) -> Self {
        Self {
            category: FieldCategory::Alphanumeric,
            format: None,
            description: description.map(str::to_owned),
        }
    }

    /// The shared passthrough config.
    pub fn passthrough() -> &'static FieldConfig {
        &PASSTHROUGH
    }

    /// `true` unless the field is passed through.
    pub fn is_sensitive(&self) -> bool {
        self.category != FieldCategory::Passthrough
    }
}

/// A recoverable problem found while building a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogWarning {
    /// The external dictionary could not be used; the builtin one was loaded.
    LoadFailure {
        /// Where the dictionary came from (path, URL, object key).
        source: String,
        /// Why it was rejected.
        reason: String,
    },
    /// A `type` cell was not `numeric` or `alphanumeric`; the field passes through.
    UnknownType {
        /// Normalised field name.
        field: String,
        /// The rejected type text.
        value: String,
    },
    /// The same field appeared twice; the later entry wins.
    DuplicateField {
        /// Normalised field name.
        field: String,
    },
    /// A `format` cell declared no digit positions and was ignored.
    InvalidFormat {
        /// Normalised field name.
        field: String,
        /// The rejected template.
        format: String,
    },
}

impl fmt::Display for CatalogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogWarning::LoadFailure { source, reason } => {
                write!(f, "could not load catalog from {source}: {reason}; using builtin catalog")
            }
            CatalogWarning::UnknownType { field, value } => {
                write!(f, "field `{field}` has unknown type `{value}`; treating as passthrough")
            }
            CatalogWarning::DuplicateField { field } => {
                write!(f, "field `{field}` is defined more than once; last definition wins")
            }
            CatalogWarning::InvalidFormat { field, format } => {
                write!(
                    f,
                    "field `{field}` has format `{format}` with no digit positions; ignoring it"
                )
            }
        }
    }
}

/// Read-only mapping from normalised field name to [`FieldConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCatalog {
    fields: BTreeMap<String, FieldConfig>,
}

/// Trim and lower-case a field name.
pub fn normalize_field_name(name: &str) -> String {
    name.trim().to_lowercase()
}

impl FieldCatalog {
    /// An empty catalog: every field passes through.
    pub fn new() -> Self {
        Self::default()
    }

    /// The builtin dictionary of common PII fields.
    pub fn builtin() -> Self {
        const SSN: &str = "999-99-9999";
        const CARD: &str = "9999-9999-9999-9999";
        const PHONE: &str = "(999) 999-9999";
        const DATE: &str = "99/99/9999";

        let mut catalog = Self::new();
        let numeric = [
            ("ssn", Some(SSN), "Social Security Number"),
            ("social_security_number", Some(SSN), "Social Security Number"),
            ("credit_card", Some(CARD), "Credit Card Number"),
            ("credit_card_number", Some(CARD), "Credit Card Number"),
            ("phone", Some(PHONE), "Phone Number"),
            ("phone_number", Some(PHONE), "Phone Number"),
            ("account_number", None, "Account Number"),
            ("routing_number", None, "Routing Number"),
            ("date_of_birth", Some(DATE), "Date of Birth"),
            ("dob", Some(DATE), "Date of Birth"),
        ];
        for (name, format, description) in numeric {
            catalog.insert(name, FieldConfig::numeric(format, Some(description)));
        }
        let alphanumeric = [
            ("email", "Email Address"),
            ("customer_id", "Customer ID"),
            ("passport", "Passport Number"),
            ("drivers_license", "Driver's License"),
        ];
        for (name, description) in alphanumeric {
            catalog.insert(name, FieldConfig::alphanumeric(Some(description)));
        }
        catalog
    }

    /// Add or replace a field. Returns the previous config, if any.
    pub fn insert(&mut self, name: &str, config: FieldConfig) -> Option<FieldConfig> {
        self.fields.insert(normalize_field_name(name), config)
    }

    /// Look up a field without the passthrough fallback.
    pub fn get(&self, name: &str) -> Option<&FieldConfig> {
        self.fields.get(&normalize_field_name(name))
    }

    /// Classify a field. Unknown names classify as passthrough.
    pub fn classify(&self, name: &str) -> &FieldConfig {
        self.get(name).unwrap_or(&PASSTHROUGH)
    }

    /// `true` if the field is classified numeric or alphanumeric.
    pub fn is_sensitive(&self, name: &str) -> bool {
        self.classify(name).is_sensitive()
    }

    /// Number of catalog entries.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` if the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldConfig)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_contains_common_fields() {
        let c = FieldCatalog::builtin();
        assert_eq!(c.len(), 14);
        assert_eq!(c.classify("ssn").category, FieldCategory::Numeric);
        assert_eq!(c.classify("email").category, FieldCategory::Alphanumeric);
        assert_eq!(
            c.classify("phone").format.as_ref().map(ToString::to_string).as_deref(),
            Some("(999) 999-9999")
        );
        assert!(c.classify("account_number").format.is_none());
    }

    #[test]
    fn lookup_is_case_insensitive_and_trimmed() {
        let c = FieldCatalog::builtin();
        assert_eq!(c.classify("  SSN ").category, FieldCategory::Numeric);
        assert_eq!(c.classify("Customer_ID").category, FieldCategory::Alphanumeric);
    }

    #[test]
    fn unknown_field_is_passthrough() {
        let c = FieldCatalog::builtin();
        assert_eq!(c.classify("name").category, FieldCategory::Passthrough);
        assert!(!c.is_sensitive("address"));
        assert!(c.get("name").is_none());
    }

    #[test]
    fn insert_normalises_and_replaces() {
        let mut c = FieldCatalog::new();
        assert!(c.insert(" Zip ", FieldConfig::numeric(None, None)).is_none());
        assert!(c.insert("zip", FieldConfig::alphanumeric(None)).is_some());
        assert_eq!(c.classify("ZIP").category, FieldCategory::Alphanumeric);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn category_parse() {
        assert_eq!(FieldCategory::parse(" Numeric "), Some(FieldCategory::Numeric));
        assert_eq!(FieldCategory::parse("ALPHANUMERIC"), Some(FieldCategory::Alphanumeric));
        assert_eq!(FieldCategory::parse("hash"), None);
    }

    #[test]
    fn warning_display_mentions_field() {
        let w = CatalogWarning::UnknownType {
            field: "ssn".into(),
            value: "hash".into(),
        };
        assert!(w.to_string().contains("`ssn`"));
    }
}
