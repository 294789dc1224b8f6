//! Wire protocol and error types shared by the `fpe-svc` binaries.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
