//! In-memory session store for tests and local development

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::ThrottleState;
use crate::errors::DomainError;

use super::trait_::SessionStore;

/// Process-local session store keyed by session id
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, ThrottleState>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions currently holding state
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<ThrottleState, DomainError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned().unwrap_or_default())
    }

    async fn save(&self, session_id: &str, state: &ThrottleState) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;
        if state.is_empty() {
            sessions.remove(session_id);
        } else {
            sessions.insert(session_id.to_string(), state.clone());
        }
        Ok(())
    }

    async fn compare_and_set_last_sent(
        &self,
        session_id: &str,
        expected: Option<DateTime<Utc>>,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let mut sessions = self.sessions.write().await;
        let state = sessions.entry(session_id.to_string()).or_default();

        if state.last_sent_at != expected {
            return Ok(false);
        }

        state.last_sent_at = Some(sent_at);
        Ok(true)
    }

    async fn pull_intended_url(&self, session_id: &str) -> Result<Option<String>, DomainError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions
            .get_mut(session_id)
            .and_then(|state| state.intended_url.take()))
    }

    async fn clear(&self, session_id: &str) -> Result<(), DomainError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}
