//! Domain-specific error types and error handling.

mod types;

pub use types::ValidationError;

use thiserror::Error;

/// Core domain errors
///
/// Guard decisions are returned as values; this type only carries failures
/// the transport cannot treat as a normal outcome, chiefly store I/O.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error(transparent)]
    ValidationErr(#[from] ValidationError),
}

impl DomainError {
    /// Shorthand for an internal error with a formatted message
    pub fn internal(message: impl Into<String>) -> Self {
        DomainError::Internal {
            message: message.into(),
        }
    }

    /// Whether the error stems from caller input rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DomainError::Validation { .. } | DomainError::ValidationErr(_)
        )
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_bridges_into_domain_error() {
        let err: DomainError = ValidationError::InvalidCodeFormat.into();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("digits"));
    }

    #[test]
    fn test_internal_error_is_not_client_error() {
        let err = DomainError::internal("redis connection refused");
        assert!(!err.is_client_error());
        assert_eq!(err.to_string(), "Internal error: redis connection refused");
    }
}
