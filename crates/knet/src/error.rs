//! Error types for the tool layer.

use knet_core::{CoreError, Uuid, ValidationError};
use knet_gateway::GatewayError;
use knet_store::StoreError;
use knet_validity::ValidityError;
use thiserror::Error;

/// Errors that can occur while handling a tool call.
#[derive(Debug, Error)]
pub enum KnetError {
    /// Local state required by the call is missing. Raised before any
    /// network access; `remedy` names the tool that fixes it.
    #[error("{message}; run `{remedy}` first")]
    Precondition {
        message: String,
        remedy: &'static str,
    },

    /// An argument failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Arguments did not decode into the tool's request type.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// No tool with this name.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Key or address handling failed.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Session state could not be read or written.
    #[error("state error: {0}")]
    Store(#[from] StoreError),

    /// The gateway failed.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// An analysis could not run.
    #[error("{0}")]
    Validity(#[from] ValidityError),

    /// Configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file I/O.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("config write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A batch stopped part way. Items before `failed_index` were created
    /// and stay created.
    #[error("batch failed at item {failed_index} after creating {} fragment(s): {source}", .created.len())]
    PartialBatch {
        created: Vec<Uuid>,
        failed_index: usize,
        #[source]
        source: Box<KnetError>,
    },
}

impl KnetError {
    pub(crate) fn precondition(message: impl Into<String>, remedy: &'static str) -> Self {
        KnetError::Precondition {
            message: message.into(),
            remedy,
        }
    }

    /// JSON-RPC style error code for the outer transport.
    pub fn code(&self) -> i32 {
        match self {
            KnetError::UnknownTool(_) => -32601,
            KnetError::InvalidArguments(_) | KnetError::Validation(_) => -32602,
            KnetError::Precondition { .. } => -32001,
            KnetError::Gateway(e) if e.is_not_found() => -32004,
            KnetError::Gateway(_) => -32002,
            KnetError::Validity(ValidityError::RootNotFound(_)) => -32004,
            KnetError::Validity(ValidityError::Validation(_))
            | KnetError::Validity(ValidityError::PressureOutOfRange(_)) => -32602,
            KnetError::PartialBatch { .. } => -32003,
            _ => -32603,
        }
    }

    /// Whether the underlying cause is a not-found answer.
    pub fn is_not_found(&self) -> bool {
        match self {
            KnetError::Gateway(e) => e.is_not_found(),
            KnetError::Validity(ValidityError::RootNotFound(_)) => true,
            KnetError::Validity(ValidityError::Gateway(e)) => e.is_not_found(),
            _ => false,
        }
    }
}

/// Result type for tool operations.
pub type Result<T> = std::result::Result<T, KnetError>;
