//! AWS SDK client initialisation.
//!
//! Only S3 is used: key material and field catalogs may be stored as objects.
//! Credentials come from the standard AWS credential chain.

pub mod clients;

pub use clients::AwsClients;
