//! Development dispatcher that writes notices to the log.

use async_trait::async_trait;
use tracing::info;

use mfa_core::domain::value_objects::CodeNotice;
use mfa_core::services::{DispatchError, NotificationDispatcher};
use mfa_shared::utils::mask_email;

/// Logs each notice instead of sending mail
///
/// The recipient is always masked. The code itself is only written when
/// `reveal_codes` is set, which the factory does for development builds so
/// a local login can be completed from the console.
#[derive(Debug, Clone, Default)]
pub struct LogDispatcher {
    reveal_codes: bool,
}

impl LogDispatcher {
    pub fn new(reveal_codes: bool) -> Self {
        Self { reveal_codes }
    }

    pub fn reveals_codes(&self) -> bool {
        self.reveal_codes
    }
}

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn dispatch(&self, notice: CodeNotice) -> Result<(), DispatchError> {
        let recipient = mask_email(&notice.recipient);

        if self.reveal_codes {
            info!(
                event = "mail_logged",
                recipient = %recipient,
                code = %notice.plain_code,
                ttl_minutes = notice.ttl_minutes,
                "Verification code (development only)"
            );
        } else {
            info!(
                event = "mail_logged",
                recipient = %recipient,
                ttl_minutes = notice.ttl_minutes,
                "Verification code issued"
            );
        }
        Ok(())
    }
}
