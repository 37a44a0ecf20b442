//! Payload handed to the notification dispatcher.

use std::fmt;

/// A freshly issued code addressed to its recipient
///
/// This is the only place the plaintext code travels after issue. `Debug`
/// output redacts it so the notice can be logged safely.
#[derive(Clone, PartialEq, Eq)]
pub struct CodeNotice {
    /// Delivery address
    pub recipient: String,

    /// Display name for the greeting, if known
    pub recipient_name: Option<String>,

    /// The plaintext one-time code
    pub plain_code: String,

    /// Minutes until the code expires
    pub ttl_minutes: i64,
}

impl CodeNotice {
    pub fn new(recipient: impl Into<String>, plain_code: impl Into<String>, ttl_minutes: i64) -> Self {
        Self {
            recipient: recipient.into(),
            recipient_name: None,
            plain_code: plain_code.into(),
            ttl_minutes,
        }
    }

    pub fn with_recipient_name(mut self, name: Option<String>) -> Self {
        self.recipient_name = name;
        self
    }

    /// Name to greet the recipient with, falling back to "there"
    pub fn greeting_name(&self) -> &str {
        match self.recipient_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => "there",
        }
    }
}

impl fmt::Debug for CodeNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeNotice")
            .field("recipient", &self.recipient)
            .field("recipient_name", &self.recipient_name)
            .field("plain_code", &"<redacted>")
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}
