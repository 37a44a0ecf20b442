//! Structured outcomes returned by the code manager and the access guard.
//!
//! None of these are errors: every rejection is a normal value the transport
//! renders however it likes.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::ValidationError;

/// Result of checking a candidate against the stored code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyOutcome {
    Success,
    NoActiveCode,
    Expired,
    Mismatch,
}

impl VerifyOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, VerifyOutcome::Success)
    }

    /// Whether the user should be told to request a new code
    pub fn suggests_resend(&self) -> bool {
        matches!(self, VerifyOutcome::NoActiveCode | VerifyOutcome::Expired)
    }

    pub fn message(&self) -> &'static str {
        match self {
            VerifyOutcome::Success => "Verification successful.",
            VerifyOutcome::NoActiveCode => "No verification code found. Please request a new one.",
            VerifyOutcome::Expired => "The verification code has expired. Please request a new one.",
            VerifyOutcome::Mismatch => "Invalid verification code.",
        }
    }
}

/// Data needed to render the verification page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Challenge {
    pub masked_identity: String,
    pub expires_at: DateTime<Utc>,
    pub can_resend: bool,
    pub cooldown_remaining: i64,
    pub code_length: usize,
}

/// Per-request access decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Session is verified, or the gate is disabled
    Allow,
    /// No authenticated identity; the guard does not apply
    NotApplicable,
    /// Verification is required before proceeding
    Challenge(Challenge),
}

/// Result of submitting a code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Candidate was malformed and never reached the code manager
    Invalid(ValidationError),
    /// Session is now verified; redirect to the captured resource
    Verified { redirect_to: String },
    /// Candidate was checked and rejected
    Rejected(VerifyOutcome),
    /// No authenticated identity
    NotApplicable,
}

impl SubmitOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, SubmitOutcome::Verified { .. })
    }
}

/// Result of asking for a new code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendOutcome {
    Sent { cooldown_seconds: i64 },
    CooldownActive { remaining_seconds: i64 },
    NotApplicable,
}

impl ResendOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            ResendOutcome::Sent { .. } => "A new verification code has been sent to your email.",
            ResendOutcome::CooldownActive { .. } => "Please wait before requesting a new code.",
            ResendOutcome::NotApplicable => "Two-factor verification does not apply to this request.",
        }
    }
}
