//! Resend cooldown and session verification lifetime.
//!
//! The gate is a stateless policy: it reads and mutates a [`ThrottleState`]
//! handed in by the caller and never touches storage itself.

use chrono::{DateTime, Duration, Utc};

use mfa_shared::MfaConfig;

use crate::domain::entities::ThrottleState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleGate {
    resend_cooldown: Duration,
    verification_lifetime: Option<Duration>,
}

impl ThrottleGate {
    /// `lifetime_minutes` of `None` or zero and below keeps a verification for
    /// the whole session.
    pub fn new(cooldown_seconds: i64, lifetime_minutes: Option<i64>) -> Self {
        Self {
            resend_cooldown: Duration::seconds(cooldown_seconds.max(0)),
            verification_lifetime: lifetime_minutes
                .filter(|minutes| *minutes > 0)
                .map(Duration::minutes),
        }
    }

    pub fn from_config(config: &MfaConfig) -> Self {
        Self::new(
            config.resend_cooldown_seconds,
            config.verification_lifetime_minutes,
        )
    }

    /// Resend is allowed from `last_sent_at + cooldown` onwards (inclusive).
    pub fn can_resend(&self, state: &ThrottleState, now: DateTime<Utc>) -> bool {
        match state.last_sent_at {
            Some(last_sent) => now >= last_sent + self.resend_cooldown,
            None => true,
        }
    }

    /// Whole seconds until resend is allowed, rounded up; zero when allowed.
    pub fn remaining_cooldown(&self, state: &ThrottleState, now: DateTime<Utc>) -> i64 {
        let Some(last_sent) = state.last_sent_at else {
            return 0;
        };

        let remaining = (last_sent + self.resend_cooldown) - now;
        if remaining <= Duration::zero() {
            return 0;
        }

        let secs = remaining.num_seconds();
        if remaining > Duration::seconds(secs) {
            secs + 1
        } else {
            secs
        }
    }

    pub fn mark_sent(&self, state: &mut ThrottleState, now: DateTime<Utc>) {
        state.last_sent_at = Some(now);
    }

    /// Check-and-maybe-clear: when a finite lifetime has been exceeded this
    /// removes `verified_at` from `state` before returning `false`.
    ///
    /// Elapsed time is counted in whole minutes, so a 30 minute lifetime
    /// still holds at 30m59s.
    pub fn is_session_verified(&self, state: &mut ThrottleState, now: DateTime<Utc>) -> bool {
        let Some(verified_at) = state.verified_at else {
            return false;
        };

        let Some(lifetime) = self.verification_lifetime else {
            return true;
        };

        if (now - verified_at).num_minutes() <= lifetime.num_minutes() {
            true
        } else {
            state.verified_at = None;
            false
        }
    }

    /// Completes the challenge cycle.
    pub fn mark_verified(&self, state: &mut ThrottleState, now: DateTime<Utc>) {
        state.verified_at = Some(now);
        state.last_sent_at = None;
        state.intended_url = None;
    }

    pub fn clear(&self, state: &mut ThrottleState) {
        *state = ThrottleState::default();
    }
}
