//! Domain Errors

use kanban_board::TransportError;
use thiserror::Error;

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for TransportError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(what) => TransportError::NotFound(what),
            DomainError::InvalidInput(msg) => TransportError::rejected(400, msg),
            DomainError::Conflict(msg) => TransportError::rejected(409, msg),
            DomainError::Internal(msg) => TransportError::rejected(500, msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_mapping() {
        assert_eq!(
            TransportError::from(DomainError::NotFound("todo t1".to_string())),
            TransportError::NotFound("todo t1".to_string())
        );
        assert_eq!(
            TransportError::from(DomainError::InvalidInput("bad".to_string())),
            TransportError::rejected(400, "bad")
        );
        assert_eq!(
            TransportError::from(DomainError::Conflict("archived".to_string())),
            TransportError::rejected(409, "archived")
        );
        assert_eq!(
            TransportError::from(DomainError::Internal("oops".to_string())),
            TransportError::rejected(500, "oops")
        );
    }
}
