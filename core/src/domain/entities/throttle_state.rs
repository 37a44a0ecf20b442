//! Per-session throttle state and the context object threaded through the guard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ephemeral per-session state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleState {
    /// When a code was last dispatched to this session's user
    #[serde(default)]
    pub last_sent_at: Option<DateTime<Utc>>,

    /// When this session completed verification
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,

    /// Resource requested before the challenge, restored after success
    #[serde(default)]
    pub intended_url: Option<String>,
}

impl ThrottleState {
    pub fn is_empty(&self) -> bool {
        self.last_sent_at.is_none() && self.verified_at.is_none() && self.intended_url.is_none()
    }
}

/// Explicit session handle passed into and back out of every guard call
///
/// `state` mirrors what the session store holds after the call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub session_id: String,
    pub state: ThrottleState,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            state: ThrottleState::default(),
        }
    }
}
