//! # Infrastructure Layer
//!
//! Concrete implementations of the store and dispatcher interfaces defined in
//! `mfa_core`.
//!
//! ## Architecture
//!
//! - **Database**: MySQL identity store over the users table (SQLx)
//! - **Cache**: Redis client and the Redis-backed session store
//! - **Notification**: log, HTTP mail API and SMTP dispatchers, plus a
//!   bounded background queue and the email template
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)
//! - `redis-cache`: Enable Redis session support (default)

// Re-export core types for convenience
pub use mfa_core::errors::*;

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Cache module - Redis client and session store
#[cfg(feature = "redis-cache")]
pub mod cache;

/// Notification module - email delivery
pub mod notification;

/// Configuration module for infrastructure services
pub mod config {
    //! Re-exports of the shared configuration consumed by this crate

    pub use mfa_shared::config::{
        CacheConfig, DatabaseConfig, HttpMailConfig, MailConfig, MailProvider, MfaConfig,
        SessionConfig, SmtpConfig,
    };
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mail delivery error
    #[error("Mail error: {0}")]
    Mail(String),

    /// Stored data could not be decoded
    #[error("Corrupt data: {0}")]
    Corrupt(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        DomainError::Internal {
            message: err.to_string(),
        }
    }
}
