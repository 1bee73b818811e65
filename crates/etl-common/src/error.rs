//! Error types shared across the ETL workspace

use thiserror::Error;

/// Failure to decode a shared domain value
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Invalid {kind} status: {value}")]
    InvalidStatus { kind: &'static str, value: String },
}

impl EtlError {
    /// Create an invalid status error for the given entity kind
    pub fn invalid_status(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidStatus {
            kind,
            value: value.into(),
        }
    }
}
