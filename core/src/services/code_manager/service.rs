//! Code manager implementation

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, Rng};
use std::sync::Arc;
use uuid::Uuid;

use mfa_shared::config::{MAX_CODE_LENGTH, MIN_CODE_LENGTH};

use crate::domain::entities::VerificationRecord;
use crate::domain::value_objects::VerifyOutcome;
use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::repositories::IdentityStore;

/// A code returned by [`CodeManager::issue`]
///
/// The plaintext is only valid until another issue for the same user
/// overwrites the stored hash.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedCode {
    pub plain_code: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for IssuedCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedCode")
            .field("plain_code", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Generates, stores and verifies one-time codes
pub struct CodeManager<I: ?Sized> {
    /// Identity store holding the per-user record
    store: Arc<I>,
    /// bcrypt work factor
    hash_cost: u32,
}

impl<I: ?Sized> Clone for CodeManager<I> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            hash_cost: self.hash_cost,
        }
    }
}

impl<I: IdentityStore + ?Sized> CodeManager<I> {
    /// Create a code manager with the default bcrypt cost
    pub fn new(store: Arc<I>) -> Self {
        Self {
            store,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Override the bcrypt cost (4 is the minimum bcrypt accepts)
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Generate a uniformly random code of exactly `length` digits
    ///
    /// Draws from `10^(length-1) ..= 10^length - 1` using the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// * `ValidationError::UnsupportedCodeLength` - `length` outside 4..=9
    pub fn generate_code(length: usize) -> Result<String, ValidationError> {
        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&length) {
            return Err(ValidationError::UnsupportedCodeLength {
                length,
                min: MIN_CODE_LENGTH,
                max: MAX_CODE_LENGTH,
            });
        }

        let low = 10u64.pow(length as u32 - 1);
        let high = 10u64.pow(length as u32) - 1;
        let value = OsRng.gen_range(low..=high);

        Ok(format!("{:0width$}", value, width = length))
    }

    /// Issue a new code for `user_id`, replacing any active one
    ///
    /// The salted hash and `now + ttl_minutes` are written unconditionally
    /// (last write wins). The plaintext is returned for out-of-band delivery
    /// and never stored.
    ///
    /// # Errors
    ///
    /// * `DomainError::ValidationErr` - Unsupported length or non-positive TTL
    /// * `DomainError::Internal` - Hashing or storage failure
    pub async fn issue(
        &self,
        user_id: Uuid,
        length: usize,
        ttl_minutes: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<IssuedCode> {
        if ttl_minutes <= 0 {
            return Err(ValidationError::InvalidExpiration {
                minutes: ttl_minutes,
            }
            .into());
        }

        let plain_code = Self::generate_code(length)?;
        let code_hash = self.hash_code(plain_code.clone()).await?;
        let expires_at = now + Duration::minutes(ttl_minutes);

        self.store
            .store_record(user_id, &VerificationRecord::active(code_hash, expires_at))
            .await
            .map_err(|e| {
                tracing::error!(
                    user_id = %user_id,
                    error = %e,
                    event = "code_storage_failed",
                    "Failed to store verification record"
                );
                e
            })?;

        tracing::info!(
            user_id = %user_id,
            expires_at = %expires_at,
            event = "code_issued",
            "Issued new verification code"
        );

        Ok(IssuedCode {
            plain_code,
            expires_at,
        })
    }

    /// Current record for `user_id`
    pub async fn load_record(&self, user_id: Uuid) -> DomainResult<VerificationRecord> {
        self.store.load_record(user_id).await
    }

    /// True if the record has no code or `now >= expires_at`
    pub fn is_expired(record: &VerificationRecord, now: DateTime<Utc>) -> bool {
        record.is_expired(now)
    }

    /// Check `candidate` against the stored code and consume it on success
    ///
    /// Success clears the record through a compare-and-swap against the hash
    /// that was checked. When the swap loses, the record is re-read: a
    /// cleared record means another request consumed the code
    /// (`NoActiveCode`), a different hash means a newer code replaced it
    /// (`Mismatch`).
    ///
    /// # Errors
    ///
    /// * `DomainError::Internal` - Storage failure or a corrupt stored hash
    pub async fn verify(
        &self,
        user_id: Uuid,
        candidate: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<VerifyOutcome> {
        let record = self.store.load_record(user_id).await?;

        let Some(code_hash) = record.code_hash() else {
            tracing::debug!(user_id = %user_id, event = "verify_no_active_code");
            return Ok(VerifyOutcome::NoActiveCode);
        };

        if record.is_expired(now) {
            tracing::info!(user_id = %user_id, event = "verify_expired", "Verification code expired");
            return Ok(VerifyOutcome::Expired);
        }

        if !self
            .check_hash(candidate.to_string(), code_hash.to_string())
            .await?
        {
            tracing::warn!(
                user_id = %user_id,
                event = "verify_mismatch",
                "Verification code mismatch"
            );
            return Ok(VerifyOutcome::Mismatch);
        }

        let consumed = self
            .store
            .compare_and_swap(user_id, Some(code_hash), &VerificationRecord::empty())
            .await?;

        if consumed {
            tracing::info!(user_id = %user_id, event = "verify_success", "Verification code consumed");
            return Ok(VerifyOutcome::Success);
        }

        let current = self.store.load_record(user_id).await?;
        let outcome = if current.has_active_code() {
            VerifyOutcome::Mismatch
        } else {
            VerifyOutcome::NoActiveCode
        };

        tracing::warn!(
            user_id = %user_id,
            outcome = ?outcome,
            event = "verify_lost_race",
            "Verification record changed during verification"
        );

        Ok(outcome)
    }

    async fn hash_code(&self, plain_code: String) -> DomainResult<String> {
        let cost = self.hash_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(plain_code, cost))
            .await
            .map_err(|e| DomainError::internal(format!("Code hashing task failed: {}", e)))?
            .map_err(|e| DomainError::internal(format!("Failed to hash verification code: {}", e)))
    }

    async fn check_hash(&self, candidate: String, code_hash: String) -> DomainResult<bool> {
        tokio::task::spawn_blocking(move || bcrypt::verify(candidate, &code_hash))
            .await
            .map_err(|e| DomainError::internal(format!("Code verification task failed: {}", e)))?
            .map_err(|e| DomainError::internal(format!("Stored code hash is unreadable: {}", e)))
    }
}
