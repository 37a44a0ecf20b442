//! Session store trait for per-session throttle state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::ThrottleState;
use crate::errors::DomainError;

/// Per-session key/value storage for `last_sent_at`, `verified_at` and
/// `intended_url`
///
/// Sessions are assumed to have a single owner, so plain `save` is enough for
/// most writes. The resend path still claims its slot through
/// [`SessionStore::compare_and_set_last_sent`] so that a double-click cannot
/// slip two dispatches past the cooldown.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the state for a session, default when the session is unknown
    async fn load(&self, session_id: &str) -> Result<ThrottleState, DomainError>;

    /// Persist the full state
    async fn save(&self, session_id: &str, state: &ThrottleState) -> Result<(), DomainError>;

    /// Set `last_sent_at` to `sent_at` only if it still equals `expected`
    ///
    /// # Returns
    /// * `Ok(true)` - This caller claimed the send slot
    /// * `Ok(false)` - Another request sent a code first
    async fn compare_and_set_last_sent(
        &self,
        session_id: &str,
        expected: Option<DateTime<Utc>>,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, DomainError>;

    /// Remove and return the intended URL (delete-on-read)
    async fn pull_intended_url(&self, session_id: &str) -> Result<Option<String>, DomainError>;

    /// Drop all throttle state for the session
    async fn clear(&self, session_id: &str) -> Result<(), DomainError>;
}
