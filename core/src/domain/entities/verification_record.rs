//! Per-user verification record holding the hashed active code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hashed one-time code and its expiry, attached to a user identity
///
/// The hash and the expiry are either both present (an active code) or both
/// absent (cleared). Construction goes through [`VerificationRecord::active`],
/// [`VerificationRecord::empty`] or [`VerificationRecord::from_parts`], so a
/// half-populated record never exists in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    code_hash: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl VerificationRecord {
    /// A record with no active code
    pub fn empty() -> Self {
        Self::default()
    }

    /// A record holding an active code
    pub fn active(code_hash: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            code_hash: Some(code_hash.into()),
            expires_at: Some(expires_at),
        }
    }

    /// Rebuild a record from stored columns
    ///
    /// Rows where only one column is set are treated as cleared.
    pub fn from_parts(code_hash: Option<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        match (code_hash, expires_at) {
            (Some(hash), Some(expires_at)) => Self::active(hash, expires_at),
            _ => Self::empty(),
        }
    }

    pub fn code_hash(&self) -> Option<&str> {
        self.code_hash.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn has_active_code(&self) -> bool {
        self.code_hash.is_some()
    }

    /// True when no code is set or `now` has reached the expiry.
    ///
    /// The boundary is inclusive: a code is already expired at `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => true,
        }
    }

    /// Expiry of the code if it is still usable at `now`
    pub fn live_expiry(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_at.filter(|_| !self.is_expired(now))
    }
}
