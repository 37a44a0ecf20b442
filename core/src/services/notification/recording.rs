//! Dispatcher that keeps notices in memory

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::value_objects::CodeNotice;

use super::{DispatchError, NotificationDispatcher};

/// Captures every dispatched notice
///
/// Used by tests to read back issued codes, and optionally made to fail to
/// exercise the guard's handling of delivery errors.
#[derive(Clone, Default)]
pub struct RecordingDispatcher {
    notices: Arc<Mutex<Vec<CodeNotice>>>,
    should_fail: bool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher whose every delivery fails after recording the notice
    pub fn failing() -> Self {
        Self {
            notices: Arc::default(),
            should_fail: true,
        }
    }

    /// Latest code sent to `recipient`
    pub async fn last_code_for(&self, recipient: &str) -> Option<String> {
        self.notices
            .lock()
            .await
            .iter()
            .rev()
            .find(|n| n.recipient == recipient)
            .map(|n| n.plain_code.clone())
    }

    pub async fn sent_count(&self) -> usize {
        self.notices.lock().await.len()
    }

    pub async fn notices(&self) -> Vec<CodeNotice> {
        self.notices.lock().await.clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn dispatch(&self, notice: CodeNotice) -> Result<(), DispatchError> {
        self.notices.lock().await.push(notice);

        if self.should_fail {
            return Err(DispatchError::Transport {
                message: "recording dispatcher configured to fail".to_string(),
            });
        }
        Ok(())
    }
}
