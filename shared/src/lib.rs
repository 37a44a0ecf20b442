//! Shared utilities and common types for the Mail2FA server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types (verification policy, server, storage backends)
//! - Error and response structures
//! - Utility functions (identity masking, email format validation)

pub mod config;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, AuthConfig, CacheConfig, DatabaseConfig, Environment, JwtConfig, LoggingConfig,
    MailConfig, MailProvider, MfaConfig, ServerConfig, SessionConfig,
};
pub use errors::{error_codes, ErrorResponse};
pub use types::{ApiResponse, VerificationPagePayload};
pub use utils::{masking, validation};
