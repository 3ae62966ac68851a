//! Error types for the validity engine.

use thiserror::Error;

use knet_core::{Uuid, ValidationError};
use knet_gateway::GatewayError;

/// Errors that stop an analysis. Integrity findings are not errors; they
/// are reported as data.
#[derive(Debug, Error)]
pub enum ValidityError {
    /// The fragment an analysis starts from does not exist.
    #[error("fragment not found: {0}")]
    RootNotFound(Uuid),

    /// An argument was out of range.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Context pressure outside [0, 1].
    #[error("context pressure {0} is outside [0, 1]")]
    PressureOutOfRange(f64),

    /// The gateway failed for a reason other than not-found.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Result type for validity operations.
pub type Result<T> = std::result::Result<T, ValidityError>;
