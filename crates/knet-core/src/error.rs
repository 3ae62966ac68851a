//! Error types for knet core.

use thiserror::Error;

/// Core errors that can occur while handling keys, addresses and payloads.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("entropy source failure: {0}")]
    Entropy(String),

    #[error("base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("malformed address {input:?}: {reason}")]
    MalformedAddress { input: String, reason: String },

    #[error("unknown {kind} {value:?}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("encoding error: {0}")]
    EncodingError(String),
}

/// Validation errors raised before a payload is built or signed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("confidence must be within [0, 1], got {0}")]
    ConfidenceOutOfRange(f64),

    #[error("trust level must be within [-1, 1], got {0}")]
    TrustOutOfRange(f64),

    #[error("reputation must be within [0, 1], got {0}")]
    ReputationOutOfRange(f64),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("fragments must cite the transform that produced them (source_transform is required)")]
    MissingTransform,

    #[error("{kind} {value:?} is neither a UUID nor a known name")]
    UnresolvedReference { kind: &'static str, value: String },

    #[error("entity has no signature")]
    Unsigned,
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
