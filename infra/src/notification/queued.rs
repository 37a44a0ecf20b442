//! Bounded background queue in front of another dispatcher.
//!
//! `dispatch` only enqueues, so the request that issued the code never waits
//! on mail delivery. A single worker task drains the queue in order.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use mfa_core::domain::value_objects::CodeNotice;
use mfa_core::services::{DispatchError, NotificationDispatcher};
use mfa_shared::utils::mask_email;

/// Queueing wrapper around any [`NotificationDispatcher`]
#[derive(Clone)]
pub struct QueuedDispatcher {
    sender: mpsc::Sender<CodeNotice>,
}

impl QueuedDispatcher {
    /// Start the worker task on the current tokio runtime
    ///
    /// The worker exits once every clone of the returned dispatcher is dropped.
    pub fn spawn(inner: Arc<dyn NotificationDispatcher>, capacity: usize) -> Self {
        let (dispatcher, receiver) = Self::channel(capacity);
        tokio::spawn(run_worker(receiver, inner));
        info!(event = "mail_queue_started", capacity = capacity.max(1), "Mail queue started");
        dispatcher
    }

    pub(crate) fn channel(capacity: usize) -> (Self, mpsc::Receiver<CodeNotice>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Free slots left in the queue
    pub fn available_capacity(&self) -> usize {
        self.sender.capacity()
    }
}

async fn run_worker(mut receiver: mpsc::Receiver<CodeNotice>, inner: Arc<dyn NotificationDispatcher>) {
    while let Some(notice) = receiver.recv().await {
        let recipient = mask_email(&notice.recipient);
        match inner.dispatch(notice).await {
            Ok(()) => debug!("Queued mail to {} delivered", recipient),
            Err(e) => warn!(
                event = "mail_queue_delivery_failed",
                recipient = %recipient,
                error = %e,
                "Queued verification mail could not be delivered"
            ),
        }
    }
    info!(event = "mail_queue_stopped", "Mail queue drained and stopped");
}

#[async_trait]
impl NotificationDispatcher for QueuedDispatcher {
    async fn dispatch(&self, notice: CodeNotice) -> Result<(), DispatchError> {
        self.sender.try_send(notice).map_err(|e| match e {
            TrySendError::Full(_) => DispatchError::QueueFull,
            TrySendError::Closed(_) => DispatchError::QueueClosed,
        })
    }
}
