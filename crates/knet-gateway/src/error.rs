//! Error types for gateway access.

use thiserror::Error;

/// Errors returned by a [`crate::Gateway`].
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// A body could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The gateway answered with a non-success status.
    #[error("gateway error {status}: {message}")]
    Remote { status: u16, message: String },

    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The gateway client could not be constructed.
    #[error("invalid gateway configuration: {0}")]
    InvalidConfig(String),
}

impl GatewayError {
    /// Whether this is a not-found answer rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound(_))
    }

    pub(crate) fn rejected(status: u16, message: impl Into<String>) -> Self {
        GatewayError::Remote {
            status,
            message: message.into(),
        }
    }
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
