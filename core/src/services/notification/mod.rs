//! Notification capability used to deliver issued codes.
//!
//! The guard depends on this single-method trait only; concrete transports
//! (log output, HTTP mail APIs, queues) live in the infrastructure crate.

mod recording;

pub use recording::RecordingDispatcher;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::value_objects::CodeNotice;

/// Delivery failures reported by a dispatcher
///
/// The guard logs these and carries on; they never change an access decision.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Mail transport error: {message}")]
    Transport { message: String },

    #[error("Mail provider rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Notification queue is full")]
    QueueFull,

    #[error("Notification queue is closed")]
    QueueClosed,
}

/// Delivers a freshly issued code to its recipient
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notice: CodeNotice) -> Result<(), DispatchError>;
}
