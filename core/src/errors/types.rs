//! Validation errors raised before a code reaches the code manager

use thiserror::Error;

/// Rejections of malformed input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("The verification code must be {expected} digits (got {actual})")]
    InvalidCodeLength { expected: usize, actual: usize },

    #[error("The verification code may only contain digits")]
    InvalidCodeFormat,

    #[error("Unsupported code length {length}; expected between {min} and {max}")]
    UnsupportedCodeLength { length: usize, min: usize, max: usize },

    #[error("Code expiration must be positive (got {minutes} minutes)")]
    InvalidExpiration { minutes: i64 },
}

impl ValidationError {
    /// Check a submitted candidate against the configured code length
    pub fn check_candidate(candidate: &str, expected: usize) -> Result<(), ValidationError> {
        if !candidate.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidCodeFormat);
        }
        if candidate.len() != expected {
            return Err(ValidationError::InvalidCodeLength {
                expected,
                actual: candidate.len(),
            });
        }
        Ok(())
    }
}
