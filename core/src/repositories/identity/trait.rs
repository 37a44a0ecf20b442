//! Identity store trait for per-user verification records.
//!
//! The record lives next to the user (the `mfa_code` / `mfa_expires_at`
//! columns in the MySQL implementation). Besides plain reads and writes the
//! store must offer a compare-and-swap so that two concurrent verifications
//! of the same code cannot both succeed.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::VerificationRecord;
use crate::errors::DomainError;

/// Repository trait for verification record persistence
///
/// # Example Implementation
/// ```no_run
/// use async_trait::async_trait;
/// use uuid::Uuid;
/// use mfa_core::repositories::IdentityStore;
/// use mfa_core::domain::entities::VerificationRecord;
/// use mfa_core::errors::DomainError;
///
/// struct PostgresIdentityStore {
///     // connection pool
/// }
///
/// #[async_trait]
/// impl IdentityStore for PostgresIdentityStore {
///     async fn load_record(&self, user_id: Uuid) -> Result<VerificationRecord, DomainError> {
///         Ok(VerificationRecord::empty())
///     }
///
///     // ... other methods
/// #   async fn store_record(&self, _: Uuid, _: &VerificationRecord) -> Result<(), DomainError> { Ok(()) }
/// #   async fn compare_and_swap(&self, _: Uuid, _: Option<&str>, _: &VerificationRecord) -> Result<bool, DomainError> { Ok(true) }
/// }
/// ```
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Load the current verification record for a user
    ///
    /// # Returns
    /// * `Ok(record)` - The stored record, empty when no code was ever issued
    /// * `Err(DomainError::NotFound)` - The user does not exist in a store that requires it
    /// * `Err(DomainError::Internal)` - Storage failure
    async fn load_record(&self, user_id: Uuid) -> Result<VerificationRecord, DomainError>;

    /// Overwrite the record unconditionally (last write wins)
    async fn store_record(
        &self,
        user_id: Uuid,
        record: &VerificationRecord,
    ) -> Result<(), DomainError>;

    /// Replace the record only if its current hash equals `expected_hash`
    ///
    /// `None` matches a cleared record. Each issued hash is salted, so the
    /// hash alone identifies one issuance.
    ///
    /// # Returns
    /// * `Ok(true)` - The swap was applied
    /// * `Ok(false)` - The record changed since it was read
    async fn compare_and_swap(
        &self,
        user_id: Uuid,
        expected_hash: Option<&str>,
        new_record: &VerificationRecord,
    ) -> Result<bool, DomainError>;
}
