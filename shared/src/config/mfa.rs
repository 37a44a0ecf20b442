//! Two-factor verification policy configuration

use serde::{Deserialize, Serialize};

/// Smallest code length the verifier accepts
pub const MIN_CODE_LENGTH: usize = 4;

/// Largest code length the verifier accepts
pub const MAX_CODE_LENGTH: usize = 9;

const MIN_HASH_COST: u32 = 4;
const MAX_HASH_COST: u32 = 31;

/// Verification policy shared by the code manager, throttle gate and guard
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MfaConfig {
    /// Global kill switch; when false every request is treated as verified
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Number of digits in a generated code
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Minutes before an issued code expires
    #[serde(default = "default_code_expiration_minutes")]
    pub code_expiration_minutes: i64,

    /// Seconds a session must wait between two code dispatches
    #[serde(default = "default_resend_cooldown_seconds")]
    pub resend_cooldown_seconds: i64,

    /// Session storage key holding the verified marker
    #[serde(default = "default_session_key")]
    pub session_key: String,

    /// Minutes a successful verification stays valid; `None` keeps it for the whole session
    #[serde(default)]
    pub verification_lifetime_minutes: Option<i64>,

    /// bcrypt cost used when hashing issued codes
    #[serde(default = "default_code_hash_cost")]
    pub code_hash_cost: u32,

    /// Path prefix under which the verification routes are mounted
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,

    /// Subject line of the verification email
    #[serde(default = "default_email_subject")]
    pub email_subject: String,

    /// Application name used in the email signature
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

impl Default for MfaConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            code_length: default_code_length(),
            code_expiration_minutes: default_code_expiration_minutes(),
            resend_cooldown_seconds: default_resend_cooldown_seconds(),
            session_key: default_session_key(),
            verification_lifetime_minutes: None,
            code_hash_cost: default_code_hash_cost(),
            route_prefix: default_route_prefix(),
            email_subject: default_email_subject(),
            app_name: default_app_name(),
        }
    }
}

impl MfaConfig {
    /// Create from `MAIL2FA_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            enabled: env_parse("MAIL2FA_ENABLED").unwrap_or(defaults.enabled),
            code_length: env_parse("MAIL2FA_CODE_LENGTH").unwrap_or(defaults.code_length),
            code_expiration_minutes: env_parse("MAIL2FA_CODE_EXPIRATION")
                .unwrap_or(defaults.code_expiration_minutes),
            resend_cooldown_seconds: env_parse("MAIL2FA_RESEND_COOLDOWN")
                .unwrap_or(defaults.resend_cooldown_seconds),
            session_key: std::env::var("MAIL2FA_SESSION_KEY").unwrap_or(defaults.session_key),
            verification_lifetime_minutes: env_parse("MAIL2FA_VERIFICATION_LIFETIME")
                .filter(|minutes: &i64| *minutes > 0),
            code_hash_cost: env_parse("MAIL2FA_CODE_HASH_COST").unwrap_or(defaults.code_hash_cost),
            route_prefix: std::env::var("MAIL2FA_ROUTE_PREFIX").unwrap_or(defaults.route_prefix),
            email_subject: std::env::var("MAIL2FA_EMAIL_SUBJECT")
                .unwrap_or(defaults.email_subject),
            app_name: std::env::var("APP_NAME").unwrap_or(defaults.app_name),
        }
    }

    /// Disable the verification gate entirely
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Set the verification lifetime in minutes; zero or less means unbounded
    pub fn with_verification_lifetime(mut self, minutes: i64) -> Self {
        self.verification_lifetime_minutes = Some(minutes).filter(|m| *m > 0);
        self
    }

    /// Set the resend cooldown in seconds
    pub fn with_resend_cooldown(mut self, seconds: i64) -> Self {
        self.resend_cooldown_seconds = seconds;
        self
    }

    /// Set the code length, clamped to the supported range
    pub fn with_code_length(mut self, length: usize) -> Self {
        self.code_length = length.clamp(MIN_CODE_LENGTH, MAX_CODE_LENGTH);
        self
    }

    /// Set the bcrypt cost for code hashes
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.code_hash_cost = cost;
        self
    }

    /// Reject values the code manager or throttle gate cannot work with
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&self.code_length) {
            return Err(format!(
                "code_length must be between {} and {} (got {})",
                MIN_CODE_LENGTH, MAX_CODE_LENGTH, self.code_length
            ));
        }
        if self.code_expiration_minutes <= 0 {
            return Err(format!(
                "code_expiration_minutes must be positive (got {})",
                self.code_expiration_minutes
            ));
        }
        if self.resend_cooldown_seconds < 0 {
            return Err(format!(
                "resend_cooldown_seconds must not be negative (got {})",
                self.resend_cooldown_seconds
            ));
        }
        if !(MIN_HASH_COST..=MAX_HASH_COST).contains(&self.code_hash_cost) {
            return Err(format!(
                "code_hash_cost must be between {} and {} (got {})",
                MIN_HASH_COST, MAX_HASH_COST, self.code_hash_cost
            ));
        }
        if self.session_key.trim().is_empty() {
            return Err("session_key must not be empty".to_string());
        }
        Ok(())
    }

    /// Route path relative to the server root, e.g. `/2fa/verify`
    pub fn route(&self, path: &str) -> String {
        let prefix = self.route_prefix.trim_matches('/');
        let path = path.trim_start_matches('/');
        if prefix.is_empty() {
            format!("/{}", path)
        } else {
            format!("/{}/{}", prefix, path)
        }
    }
}

/// Parse an optional environment variable, treating empty and `null` as unset
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
        .and_then(|v| v.parse().ok())
}

fn default_enabled() -> bool {
    true
}

fn default_code_length() -> usize {
    6
}

fn default_code_expiration_minutes() -> i64 {
    10
}

fn default_resend_cooldown_seconds() -> i64 {
    60
}

fn default_session_key() -> String {
    String::from("mail2fa_verified")
}

fn default_code_hash_cost() -> u32 {
    10
}

fn default_route_prefix() -> String {
    String::from("2fa")
}

fn default_email_subject() -> String {
    String::from("Your Verification Code")
}

fn default_app_name() -> String {
    String::from("Mail2FA")
}
