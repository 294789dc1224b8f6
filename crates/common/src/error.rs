//! Service-level error type.

use thiserror::Error;

/// Errors surfaced to HTTP callers.
///
/// Variants map to status codes:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::Unavailable`] → 503
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed body, or a field that failed in strict mode.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The engine is not ready yet.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// A worker task panicked or was cancelled.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::Unavailable(_) => 503,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Machine-readable code used in [`crate::protocol::ErrorResponse`].
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::Unavailable(_) => "unavailable",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}
