//! Outbound mail configuration

use serde::{Deserialize, Serialize};
use std::{env, str::FromStr};

/// Which transport delivers verification emails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    /// Write notices to the log instead of sending them
    #[default]
    Log,
    /// JSON mail API over HTTPS
    Http,
    /// SMTP relay
    Smtp,
}

impl FromStr for MailProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log" | "console" => Ok(MailProvider::Log),
            "http" | "api" => Ok(MailProvider::Http),
            "smtp" => Ok(MailProvider::Smtp),
            _ => Err(format!("Invalid mail provider: {}", s)),
        }
    }
}

/// HTTP mail API settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpMailConfig {
    /// Endpoint receiving the JSON message
    pub endpoint: String,

    /// Bearer token sent with every request
    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for HttpMailConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// SMTP relay settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::from("localhost"),
            port: 587,
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Complete mail configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailConfig {
    #[serde(default)]
    pub provider: MailProvider,

    /// Sender address
    pub from_address: String,

    /// Sender display name
    pub from_name: String,

    #[serde(default)]
    pub http: HttpMailConfig,

    #[serde(default)]
    pub smtp: SmtpConfig,

    /// Delivery attempts before giving up (at least one is always made)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff between attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Capacity of the background delivery queue, 0 disables queueing
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            provider: MailProvider::default(),
            from_address: String::from("no-reply@localhost"),
            from_name: String::from("Mail2FA"),
            http: HttpMailConfig::default(),
            smtp: SmtpConfig::default(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl MailConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            provider: parse("MAIL_PROVIDER").unwrap_or(defaults.provider),
            from_address: env::var("MAIL_FROM_ADDRESS").unwrap_or(defaults.from_address),
            from_name: env::var("MAIL_FROM_NAME").unwrap_or(defaults.from_name),
            http: HttpMailConfig {
                endpoint: env::var("MAIL_HTTP_ENDPOINT").unwrap_or_default(),
                api_key: env::var("MAIL_HTTP_API_KEY").unwrap_or_default(),
                request_timeout_secs: parse("MAIL_HTTP_TIMEOUT")
                    .unwrap_or_else(default_request_timeout),
            },
            smtp: SmtpConfig {
                host: env::var("SMTP_HOST").unwrap_or(defaults.smtp.host),
                port: parse("SMTP_PORT").unwrap_or(defaults.smtp.port),
                username: env::var("SMTP_USERNAME").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            },
            max_retries: parse("MAIL_MAX_RETRIES").unwrap_or(defaults.max_retries),
            retry_delay_ms: parse("MAIL_RETRY_DELAY_MS").unwrap_or(defaults.retry_delay_ms),
            queue_capacity: parse("MAIL_QUEUE_CAPACITY").unwrap_or(defaults.queue_capacity),
        }
    }

    /// Formatted `Name <address>` sender
    pub fn sender(&self) -> String {
        if self.from_name.is_empty() {
            self.from_address.clone()
        } else {
            format!("{} <{}>", self.from_name, self.from_address)
        }
    }
}

fn parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn default_request_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_queue_capacity() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mail_provider_parsing() {
        assert_eq!("SMTP".parse::<MailProvider>().unwrap(), MailProvider::Smtp);
        assert_eq!("api".parse::<MailProvider>().unwrap(), MailProvider::Http);
        assert_eq!("console".parse::<MailProvider>().unwrap(), MailProvider::Log);
        assert!("pigeon".parse::<MailProvider>().is_err());
    }

    #[test]
    fn test_sender_formatting() {
        let mut config = MailConfig::default();
        assert_eq!(config.sender(), "Mail2FA <no-reply@localhost>");

        config.from_name.clear();
        assert_eq!(config.sender(), "no-reply@localhost");
    }

    #[test]
    fn test_mail_config_defaults() {
        let config = MailConfig::default();
        assert_eq!(config.provider, MailProvider::Log);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.queue_capacity, 256);
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.http.request_timeout_secs, 10);
    }

    #[test]
    fn test_from_env_reads_typed_values() {
        env::set_var("MAIL_PROVIDER", "smtp");
        env::set_var("SMTP_PORT", "2525");
        env::set_var("MAIL_HTTP_TIMEOUT", "3");
        env::set_var("MAIL_MAX_RETRIES", "5");
        env::set_var("MAIL_RETRY_DELAY_MS", "not-a-number");
        env::set_var("MAIL_QUEUE_CAPACITY", "0");

        let config = MailConfig::from_env();

        for key in [
            "MAIL_PROVIDER",
            "SMTP_PORT",
            "MAIL_HTTP_TIMEOUT",
            "MAIL_MAX_RETRIES",
            "MAIL_RETRY_DELAY_MS",
            "MAIL_QUEUE_CAPACITY",
        ] {
            env::remove_var(key);
        }

        assert_eq!(config.provider, MailProvider::Smtp);
        assert_eq!(config.smtp.port, 2525);
        assert_eq!(config.http.request_timeout_secs, 3);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_delay_ms, 500);
        assert_eq!(config.queue_capacity, 0);
    }
}
