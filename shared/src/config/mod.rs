//! Configuration module with business-specific sub-modules
//!
//! - `mfa` - Verification policy (code length, expiry, cooldown, lifetime)
//! - `auth` - Bearer token verification and session cookie settings
//! - `cache` - Redis configuration for the session store
//! - `database` - MySQL configuration for the identity store
//! - `environment` - Environment detection and logging configuration
//! - `mail` - Outbound mail transport
//! - `server` - HTTP server configuration

pub mod auth;
pub mod cache;
pub mod database;
pub mod environment;
pub mod mail;
pub mod mfa;
pub mod server;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use auth::{AuthConfig, JwtConfig, SessionConfig};
pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use mail::{HttpMailConfig, MailConfig, MailProvider, SmtpConfig};
pub use mfa::{MfaConfig, MAX_CODE_LENGTH, MIN_CODE_LENGTH};
pub use server::ServerConfig;

/// Storage backend used for identity records or session state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local storage, development and tests only
    #[default]
    Memory,
    /// MySQL identity records
    Mysql,
    /// Redis session hashes
    Redis,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "mysql" => Ok(StorageBackend::Mysql),
            "redis" => Ok(StorageBackend::Redis),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Verification policy
    pub mfa: MfaConfig,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Redis configuration
    pub cache: CacheConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Where verification records live
    #[serde(default)]
    pub identity_backend: StorageBackend,

    /// Where session throttle state lives
    #[serde(default)]
    pub session_backend: StorageBackend,

    /// Outbound mail transport
    #[serde(default)]
    pub mail: MailConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let environment = Environment::default();
        Self {
            environment,
            mfa: MfaConfig::default(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::for_environment(environment),
            identity_backend: StorageBackend::Memory,
            session_backend: StorageBackend::Memory,
            mail: MailConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment
    pub fn from_env() -> Self {
        let environment = Environment::from_env();
        let parse_backend = |key: &str| -> StorageBackend {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default()
        };

        Self {
            environment,
            mfa: MfaConfig::from_env(),
            server: ServerConfig::from_env(),
            database: DatabaseConfig::from_env(),
            cache: CacheConfig::from_env(),
            auth: AuthConfig::from_env(),
            logging: LoggingConfig::for_environment(environment),
            identity_backend: parse_backend("IDENTITY_BACKEND"),
            session_backend: parse_backend("SESSION_BACKEND"),
            mail: MailConfig::from_env(),
        }
    }
}
