//! Notification Module
//!
//! Delivery of issued verification codes by email.
//!
//! ## Dispatchers
//!
//! - **Log**: masked console output for development
//! - **HTTP**: JSON mail API with retry and backoff
//! - **SMTP**: multipart mail through a relay
//! - **Queued**: bounded background queue wrapping either network dispatcher

use std::sync::Arc;

use mfa_core::services::NotificationDispatcher;
use mfa_shared::config::{Environment, MailConfig, MailProvider, MfaConfig};

use crate::InfrastructureError;

pub mod http_mail;
pub mod log;
pub mod queued;
pub mod smtp;
pub mod template;

pub use http_mail::HttpMailDispatcher;
pub use log::LogDispatcher;
pub use queued::QueuedDispatcher;
pub use smtp::SmtpDispatcher;
pub use template::{EmailTemplate, RenderedEmail};

#[cfg(test)]
mod tests;

/// Create the dispatcher selected by `mail.provider`
///
/// Network dispatchers sit behind a [`QueuedDispatcher`] unless
/// `queue_capacity` is zero. A misconfigured provider is an error rather
/// than a silent fallback, so a production deployment cannot start without
/// a working mail path. Must be called from within a tokio runtime.
pub fn create_dispatcher(
    mail: &MailConfig,
    mfa: &MfaConfig,
    environment: Environment,
) -> Result<Arc<dyn NotificationDispatcher>, InfrastructureError> {
    let template = EmailTemplate::from_config(mfa);

    let direct: Arc<dyn NotificationDispatcher> = match mail.provider {
        MailProvider::Log => {
            if environment.is_production() {
                tracing::warn!("Mail provider 'log' in production: codes will not be delivered");
            }
            return Ok(Arc::new(LogDispatcher::new(environment.is_development())));
        }
        MailProvider::Http => Arc::new(HttpMailDispatcher::new(mail, template)?),
        MailProvider::Smtp => Arc::new(SmtpDispatcher::new(mail, template)?),
    };

    tracing::info!(
        event = "mail_provider_selected",
        provider = ?mail.provider,
        queued = mail.queue_capacity > 0,
        "Mail dispatcher ready"
    );

    if mail.queue_capacity == 0 {
        Ok(direct)
    } else {
        Ok(Arc::new(QueuedDispatcher::spawn(direct, mail.queue_capacity)))
    }
}
