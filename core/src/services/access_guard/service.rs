//! Access guard implementation

use chrono::{DateTime, Utc};
use std::sync::Arc;

use mfa_shared::utils::mask_email;
use mfa_shared::MfaConfig;

use crate::domain::entities::{Identity, SessionContext, ThrottleState};
use crate::domain::value_objects::{
    AccessDecision, Challenge, CodeNotice, ResendOutcome, SubmitOutcome,
};
use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::repositories::{IdentityStore, SessionStore};
use crate::services::clock::{Clock, SystemClock};
use crate::services::code_manager::{CodeManager, IssuedCode};
use crate::services::notification::NotificationDispatcher;
use crate::services::throttle_gate::ThrottleGate;

/// Redirect target when no resource was captured before the challenge
const DEFAULT_REDIRECT: &str = "/";

/// Request-facing guard composing [`CodeManager`] and [`ThrottleGate`]
///
/// Store parameters may be trait objects, e.g.
/// `AccessGuard<dyn IdentityStore, dyn SessionStore, dyn NotificationDispatcher>`.
pub struct AccessGuard<I: ?Sized, S: ?Sized, N: ?Sized> {
    codes: CodeManager<I>,
    throttle: ThrottleGate,
    sessions: Arc<S>,
    dispatcher: Arc<N>,
    clock: Arc<dyn Clock>,
    config: MfaConfig,
}

impl<I, S, N> AccessGuard<I, S, N>
where
    I: IdentityStore + ?Sized,
    S: SessionStore + ?Sized,
    N: NotificationDispatcher + ?Sized,
{
    /// Create a new guard reading time from the system clock
    ///
    /// # Arguments
    ///
    /// * `identities` - Store for per-user verification records
    /// * `sessions` - Store for per-session throttle state
    /// * `dispatcher` - Delivery capability for issued codes
    /// * `config` - Verification policy
    pub fn new(identities: Arc<I>, sessions: Arc<S>, dispatcher: Arc<N>, config: MfaConfig) -> Self {
        Self {
            codes: CodeManager::new(identities).with_hash_cost(config.code_hash_cost),
            throttle: ThrottleGate::from_config(&config),
            sessions,
            dispatcher,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the clock, mainly for tests
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &MfaConfig {
        &self.config
    }

    /// Decide whether a request may proceed
    ///
    /// Verified sessions and a disabled gate yield `Allow`; requests without
    /// an identity yield `NotApplicable`. Otherwise the session is challenged:
    /// a new code is issued and dispatched if none is live, and
    /// `requested_url` is captured as the post-verification redirect unless
    /// one is already held.
    ///
    /// # Errors
    ///
    /// * `DomainError::Internal` - Store failure
    pub async fn evaluate_access(
        &self,
        identity: Option<&Identity>,
        session: &mut SessionContext,
        requested_url: Option<&str>,
    ) -> DomainResult<AccessDecision> {
        if !self.config.enabled {
            return Ok(AccessDecision::Allow);
        }
        let Some(identity) = identity else {
            return Ok(AccessDecision::NotApplicable);
        };

        let now = self.clock.now();
        let mut state = self.sessions.load(&session.session_id).await?;

        let had_marker = state.verified_at.is_some();
        if self.throttle.is_session_verified(&mut state, now) {
            session.state = state;
            return Ok(AccessDecision::Allow);
        }
        if had_marker {
            tracing::info!(
                user_id = %identity.user_id,
                event = "verification_lifetime_elapsed",
                "Session verification expired, re-challenging"
            );
        }

        if state.intended_url.is_none() {
            state.intended_url = requested_url.map(str::to_string);
        }

        let expires_at = match self.live_code_expiry(identity, now).await? {
            Some(expires_at) => expires_at,
            None => {
                let issued = self.issue_and_dispatch(identity, now).await?;
                self.throttle.mark_sent(&mut state, now);
                issued.expires_at
            }
        };

        self.sessions.save(&session.session_id, &state).await?;

        let challenge = Challenge {
            masked_identity: mask_email(&identity.email),
            expires_at,
            can_resend: self.throttle.can_resend(&state, now),
            cooldown_remaining: self.throttle.remaining_cooldown(&state, now),
            code_length: self.config.code_length,
        };
        session.state = state;

        tracing::debug!(
            user_id = %identity.user_id,
            email = %challenge.masked_identity,
            event = "access_challenged",
            "Verification required"
        );

        Ok(AccessDecision::Challenge(challenge))
    }

    /// Check a submitted code and mark the session verified on success
    ///
    /// Malformed candidates are rejected as `Invalid` before the code manager
    /// is consulted. On success the captured intended URL is consumed and
    /// returned as the redirect target, `/` when none was captured.
    ///
    /// # Errors
    ///
    /// * `DomainError::Internal` - Store failure
    pub async fn submit_code(
        &self,
        identity: Option<&Identity>,
        session: &mut SessionContext,
        candidate: &str,
    ) -> DomainResult<SubmitOutcome> {
        if !self.config.enabled {
            return Ok(SubmitOutcome::Verified {
                redirect_to: DEFAULT_REDIRECT.to_string(),
            });
        }
        let Some(identity) = identity else {
            return Ok(SubmitOutcome::NotApplicable);
        };

        if let Err(err) = ValidationError::check_candidate(candidate, self.config.code_length) {
            tracing::warn!(
                user_id = %identity.user_id,
                event = "invalid_code_format",
                code_length = candidate.len(),
                "Invalid verification code format provided"
            );
            return Ok(SubmitOutcome::Invalid(err));
        }

        let now = self.clock.now();
        let outcome = self.codes.verify(identity.user_id, candidate, now).await?;

        if !outcome.is_success() {
            session.state = self.sessions.load(&session.session_id).await?;
            return Ok(SubmitOutcome::Rejected(outcome));
        }

        let redirect_to = self
            .sessions
            .pull_intended_url(&session.session_id)
            .await?
            .unwrap_or_else(|| DEFAULT_REDIRECT.to_string());

        let mut state = self.sessions.load(&session.session_id).await?;
        self.throttle.mark_verified(&mut state, now);
        self.sessions.save(&session.session_id, &state).await?;
        session.state = state;

        tracing::info!(
            user_id = %identity.user_id,
            event = "session_verified",
            redirect_to = %redirect_to,
            "Session verified"
        );

        Ok(SubmitOutcome::Verified { redirect_to })
    }

    /// Issue and dispatch a new code unless the session is cooling down
    ///
    /// The send slot is claimed with a conditional write on `last_sent_at`,
    /// so of two racing resends only one dispatches. If issuing then fails
    /// the slot is handed back so the caller can retry at once.
    ///
    /// # Errors
    ///
    /// * `DomainError::Internal` - Store failure
    pub async fn request_resend(
        &self,
        identity: Option<&Identity>,
        session: &mut SessionContext,
    ) -> DomainResult<ResendOutcome> {
        if !self.config.enabled {
            return Ok(ResendOutcome::NotApplicable);
        }
        let Some(identity) = identity else {
            return Ok(ResendOutcome::NotApplicable);
        };

        let now = self.clock.now();
        let state = self.sessions.load(&session.session_id).await?;

        if !self.throttle.can_resend(&state, now) {
            return Ok(self.cooldown_active(identity, session, state, now));
        }

        let claimed = self
            .sessions
            .compare_and_set_last_sent(&session.session_id, state.last_sent_at, now)
            .await?;

        if !claimed {
            let state = self.sessions.load(&session.session_id).await?;
            return Ok(self.cooldown_active(identity, session, state, now));
        }

        if let Err(e) = self.issue_and_dispatch(identity, now).await {
            self.release_send_slot(&session.session_id, state.last_sent_at, now)
                .await;
            return Err(e);
        }
        session.state = self.sessions.load(&session.session_id).await?;

        Ok(ResendOutcome::Sent {
            cooldown_seconds: self.config.resend_cooldown_seconds,
        })
    }

    /// Clear all verification state for the session, forcing a re-challenge
    ///
    /// # Errors
    ///
    /// * `DomainError::Internal` - Store failure
    pub async fn reset(&self, session: &mut SessionContext) -> DomainResult<()> {
        self.sessions.clear(&session.session_id).await?;
        self.throttle.clear(&mut session.state);

        tracing::info!(
            session_id = %session.session_id,
            event = "verification_reset",
            "Session verification cleared"
        );
        Ok(())
    }

    /// Restore `last_sent_at` after a claimed resend failed to issue
    ///
    /// Only undoes our own claim; a later send by another request is kept.
    async fn release_send_slot(
        &self,
        session_id: &str,
        previous: Option<DateTime<Utc>>,
        claimed_at: DateTime<Utc>,
    ) {
        let result = async {
            let mut state = self.sessions.load(session_id).await?;
            if state.last_sent_at == Some(claimed_at) {
                state.last_sent_at = previous;
                self.sessions.save(session_id, &state).await?;
            }
            Ok::<(), DomainError>(())
        }
        .await;

        if let Err(e) = result {
            tracing::error!(
                session_id = %session_id,
                error = %e,
                event = "resend_slot_release_failed",
                "Failed to release resend slot after issue error"
            );
        }
    }

    /// Expiry of the user's live code, `None` when a new one is needed
    async fn live_code_expiry(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<DateTime<Utc>>> {
        let record = self.codes.load_record(identity.user_id).await?;
        Ok(record.live_expiry(now))
    }

    async fn issue_and_dispatch(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> DomainResult<IssuedCode> {
        let issued = self
            .codes
            .issue(
                identity.user_id,
                self.config.code_length,
                self.config.code_expiration_minutes,
                now,
            )
            .await
            .map_err(|e| match e {
                DomainError::ValidationErr(err) => {
                    DomainError::internal(format!("Invalid verification policy: {}", err))
                }
                other => other,
            })?;

        let notice = CodeNotice::new(
            identity.email.clone(),
            issued.plain_code.clone(),
            self.config.code_expiration_minutes,
        )
        .with_recipient_name(identity.name.clone());

        if let Err(e) = self.dispatcher.dispatch(notice).await {
            tracing::warn!(
                user_id = %identity.user_id,
                email = %mask_email(&identity.email),
                error = %e,
                event = "code_dispatch_failed",
                "Failed to dispatch verification code"
            );
        }

        Ok(issued)
    }

    fn cooldown_active(
        &self,
        identity: &Identity,
        session: &mut SessionContext,
        state: ThrottleState,
        now: DateTime<Utc>,
    ) -> ResendOutcome {
        let remaining_seconds = self.throttle.remaining_cooldown(&state, now);
        session.state = state;

        tracing::warn!(
            user_id = %identity.user_id,
            cooldown_remaining = remaining_seconds,
            event = "resend_cooldown_active",
            "Verification code resend requested during cooldown"
        );

        ResendOutcome::CooldownActive { remaining_seconds }
    }
}
