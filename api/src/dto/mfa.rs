//! Request and response bodies for the verification endpoints

use serde::{Deserialize, Serialize};
use validator::Validate;

use mfa_core::domain::value_objects::Challenge;
use mfa_shared::VerificationPagePayload;

/// Body of `POST /{prefix}/verify`
///
/// Only presence is checked here; exact length and digits are enforced by
/// the guard against the configured code length.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyCodeRequest {
    #[validate(length(min = 1, max = 32, message = "The verification code is required"))]
    pub code: String,
}

/// State of the current session as seen by the verification page
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Nothing to do; the session is already verified
    Verified,
    /// A code is outstanding
    Pending(VerificationPagePayload),
}

/// Body of a successful verification
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedResponse {
    pub redirect_to: String,
}

/// Body of a successful resend
#[derive(Debug, Clone, Serialize)]
pub struct ResendResponse {
    pub cooldown_seconds: i64,
}

/// Body of a reset
#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    pub cleared: bool,
}

/// Page data for a challenge
pub fn page_payload(challenge: Challenge) -> VerificationPagePayload {
    VerificationPagePayload {
        email: challenge.masked_identity,
        expires_at: Some(challenge.expires_at),
        can_resend: challenge.can_resend,
        resend_cooldown: challenge.cooldown_remaining,
        code_length: challenge.code_length,
    }
}
