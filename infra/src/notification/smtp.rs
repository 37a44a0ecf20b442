//! SMTP relay dispatcher built on lettre's async transport.

use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use mfa_core::domain::value_objects::CodeNotice;
use mfa_core::services::{DispatchError, NotificationDispatcher};
use mfa_shared::utils::mask_email;

use super::template::EmailTemplate;
use crate::config::MailConfig;
use crate::InfrastructureError;

/// Dispatcher sending multipart (text + HTML) mail through an SMTP relay
///
/// Port 465 uses implicit TLS, loopback hosts use plaintext for local mail
/// catchers, everything else upgrades with STARTTLS.
pub struct SmtpDispatcher {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    max_retries: u32,
    retry_delay_ms: u64,
    template: EmailTemplate,
}

impl SmtpDispatcher {
    /// Must be called from within a tokio runtime.
    pub fn new(config: &MailConfig, template: EmailTemplate) -> Result<Self, InfrastructureError> {
        let from: Mailbox = config
            .sender()
            .parse()
            .map_err(|e| InfrastructureError::Config(format!("Invalid sender address: {}", e)))?;

        let smtp = &config.smtp;
        let mut builder = if is_loopback(&smtp.host) {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
        } else if smtp.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
                .map_err(|e| InfrastructureError::Config(format!("Invalid SMTP host: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
                .map_err(|e| InfrastructureError::Config(format!("Invalid SMTP host: {}", e)))?
        };
        builder = builder.port(smtp.port);

        if !smtp.username.is_empty() {
            builder = builder.credentials(Credentials::new(smtp.username.clone(), smtp.password.clone()));
        }

        info!(
            event = "smtp_configured",
            host = %smtp.host,
            port = smtp.port,
            "SMTP dispatcher configured"
        );

        Ok(Self {
            transport: builder.build(),
            from,
            max_retries: config.max_retries.max(1),
            retry_delay_ms: config.retry_delay_ms,
            template,
        })
    }

    fn build_message(&self, notice: &CodeNotice) -> Result<Message, DispatchError> {
        let address: Address = notice.recipient.parse().map_err(|e| DispatchError::Transport {
            message: format!("Invalid recipient address: {}", e),
        })?;
        let email = self.template.render(notice);

        Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(notice.recipient_name.clone(), address))
            .subject(email.subject)
            .multipart(MultiPart::alternative_plain_html(email.text_body, email.html_body))
            .map_err(|e| DispatchError::Transport {
                message: format!("Failed to build message: {}", e),
            })
    }
}

fn is_loopback(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}

#[async_trait]
impl NotificationDispatcher for SmtpDispatcher {
    async fn dispatch(&self, notice: CodeNotice) -> Result<(), DispatchError> {
        let recipient = mask_email(&notice.recipient);
        let message = self.build_message(&notice)?;

        let mut attempts = 0;
        let mut delay = Duration::from_millis(self.retry_delay_ms);

        loop {
            attempts += 1;
            debug!("SMTP attempt {}/{} to {}", attempts, self.max_retries, recipient);

            let e = match self.transport.send(message.clone()).await {
                Ok(_) => {
                    info!(event = "mail_sent", recipient = %recipient, attempts, "Verification mail relayed");
                    return Ok(());
                }
                Err(e) => e,
            };

            if e.is_permanent() {
                let status = e
                    .status()
                    .and_then(|code| code.to_string().parse::<u16>().ok())
                    .unwrap_or(0);
                error!(event = "mail_rejected", recipient = %recipient, status, "SMTP relay rejected the message");
                return Err(DispatchError::Rejected {
                    status,
                    message: e.to_string(),
                });
            }

            if attempts >= self.max_retries {
                error!(event = "mail_failed", recipient = %recipient, attempts, error = %e, "Giving up on verification mail");
                return Err(DispatchError::Transport {
                    message: e.to_string(),
                });
            }

            warn!(
                "SMTP delivery failed (attempt {}/{}): {}. Retrying in {:?}...",
                attempts, self.max_retries, e, delay
            );
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(Duration::from_secs(5));
        }
    }
}
