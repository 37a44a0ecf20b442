//! In-memory identity store for tests and local development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::VerificationRecord;
use crate::errors::DomainError;

use super::trait_::IdentityStore;

/// Process-local identity store
///
/// Unknown users read as an empty record. The write lock makes
/// `compare_and_swap` atomic within the process.
#[derive(Clone, Default)]
pub struct InMemoryIdentityStore {
    records: Arc<RwLock<HashMap<Uuid, VerificationRecord>>>,
}

impl InMemoryIdentityStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with an active code
    pub async fn active_count(&self) -> usize {
        self.records
            .read()
            .await
            .values()
            .filter(|r| r.has_active_code())
            .count()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn load_record(&self, user_id: Uuid) -> Result<VerificationRecord, DomainError> {
        let records = self.records.read().await;
        Ok(records.get(&user_id).cloned().unwrap_or_default())
    }

    async fn store_record(
        &self,
        user_id: Uuid,
        record: &VerificationRecord,
    ) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        records.insert(user_id, record.clone());
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        user_id: Uuid,
        expected_hash: Option<&str>,
        new_record: &VerificationRecord,
    ) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        let current = records.get(&user_id).and_then(|r| r.code_hash());

        if current != expected_hash {
            return Ok(false);
        }

        records.insert(user_id, new_record.clone());
        Ok(true)
    }
}
