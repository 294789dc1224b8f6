//! Format-preserving pseudonymization core.
//!
//! Turns structured values (SSNs, card numbers, phone numbers, customer IDs,
//! e-mail addresses) into keyed, reversible pseudonyms of the same shape:
//! same length, digits stay digits, letters stay letters of the same case,
//! separators stay where they were.
//!
//! ```text
//! Key ──► round keys ──► NumericCipher      (Feistel over the digit string)
//!    └──► Keystream  ──► AlphanumericCipher (per-position rotation)
//!
//! FieldCatalog (field name → category + format)
//!    └──► Transformer (record / table, one cipher per classified field)
//!
//! CSV dataset ◄──► Table (header row + cells, empty cell = None)
//! ```
//!
//! # Module invariants
//!
//! - **No I/O.** Catalog parsers and the CSV dataset codec take readers,
//!   writers or byte slices; opening files and fetching objects is the
//!   caller's job.
//! - **No logging.** Recoverable problems come back as values
//!   ([`CatalogWarning`], [`TransformReport`]) and the caller routes them.
//! - Every operation is a pure function of `(input, key, config)`; all public
//!   types are `Send + Sync`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use fpe::{FieldCatalog, Key, Record, TransformOptions, Transformer};
//!
//! let key = Key::from_bytes(b"0123456789abcdef".to_vec()).unwrap();
//! let catalog = Arc::new(FieldCatalog::builtin());
//! let engine = Transformer::new(&key, catalog, TransformOptions::default()).unwrap();
//!
//! let mut record = Record::new();
//! record.insert("ssn".into(), Some("123-45-6789".into()));
//! record.insert("name".into(), Some("Jane Smith".into()));
//!
//! let encrypted = engine.encrypt_record(&record).unwrap().output;
//! assert_ne!(encrypted["ssn"], record["ssn"]);
//! assert_eq!(encrypted["name"], record["name"]);
//!
//! let decrypted = engine.decrypt_record(&encrypted).unwrap().output;
//! assert_eq!(decrypted, record);
//! ```

pub mod catalog;
pub mod crypto;
pub mod dataset;
pub mod error;
pub mod pattern;
pub mod transform;

pub use catalog::{CatalogFormat, CatalogWarning, FieldCatalog, FieldCategory, FieldConfig};
pub use crypto::alphanumeric::{AlphanumericCipher, Keystream};
pub use crypto::key::{Key, DEFAULT_KEY_LEN, RECOMMENDED_KEY_LEN};
pub use crypto::numeric::{is_mixable, NumericCipher, DEFAULT_ROUNDS};
pub use crypto::round::{DigitwiseRound, ModularRound, RoundFunction, RoundStrategy};
pub use crypto::round_key::{derive_round_key, RoundKey};
pub use error::{CatalogError, DatasetError, FieldFailure, FpeError};
pub use pattern::FormatPattern;
pub use transform::{
    Record, ShortValue, Table, TransformOptions, TransformReport, Transformed, Transformer,
};
