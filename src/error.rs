//! Error types for the sync core

use thiserror::Error;

/// Result type for transport calls
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Failures reported by the board API transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Request never reached the server or the connection dropped
    #[error("network error: {0}")]
    Network(String),

    /// Server answered with a non-success status
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    /// Response could not be decoded
    #[error("decode error: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        TransportError::Rejected {
            status,
            message: message.into(),
        }
    }
}

/// A container whose positions are not `0..n-1`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderingViolation {
    #[error("{container}: duplicate position {position}")]
    Duplicate { container: String, position: i32 },

    #[error("{container}: expected position {expected}, found {found}")]
    Gap {
        container: String,
        expected: i32,
        found: i32,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid sync config: {0}")]
    Parse(#[from] serde_json::Error),
}
