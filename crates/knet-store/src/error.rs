//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur while persisting local state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// State serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
