//! Identity and session configuration
//!
//! Identity establishment is owned by the upstream login system; this
//! service only needs enough to verify its bearer tokens and to keep a
//! per-browser session for throttle state.

use serde::{Deserialize, Serialize};

const DEFAULT_SECRET: &str = "your-secret-key-change-in-production";

/// JWT verification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Shared secret used to verify HS256 access tokens
    pub secret: String,

    /// Expected issuer claim
    pub issuer: String,

    /// Expected audience claim
    #[serde(default)]
    pub audience: Option<String>,

    /// Algorithm for JWT signing (default: HS256)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::from(DEFAULT_SECRET),
            issuer: String::from("mail2fa"),
            audience: None,
            algorithm: default_algorithm(),
        }
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Check if using default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }
}

/// Session cookie configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Session timeout in seconds, also used as the storage TTL
    pub timeout: u64,

    /// Session cookie name
    pub cookie_name: String,

    /// Session cookie secure flag (HTTPS only)
    pub secure: bool,

    /// Session cookie SameSite attribute
    pub same_site: String,

    /// Session cookie HttpOnly flag
    #[serde(default = "default_http_only")]
    pub http_only: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: 7200, // 2 hours
            cookie_name: String::from("mail2fa_session"),
            secure: false, // Set to true in production
            same_site: String::from("Lax"),
            http_only: default_http_only(),
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,

    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,
}

impl AuthConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = SessionConfig::default();

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| String::from(DEFAULT_SECRET)),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| String::from("mail2fa")),
            audience: std::env::var("JWT_AUDIENCE").ok(),
            algorithm: default_algorithm(),
        };

        let session = SessionConfig {
            timeout: std::env::var("SESSION_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout),
            cookie_name: std::env::var("SESSION_COOKIE_NAME").unwrap_or(defaults.cookie_name),
            secure: std::env::var("SESSION_SECURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.secure),
            ..defaults
        };

        Self { jwt, session }
    }

    /// Get JWT secret
    pub fn jwt_secret(&self) -> &str {
        &self.jwt.secret
    }
}

fn default_algorithm() -> String {
    String::from("HS256")
}

fn default_http_only() -> bool {
    true
}
