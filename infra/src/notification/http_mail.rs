//! Transactional mail API dispatcher.
//!
//! Posts one JSON message per notice to a provider endpoint with bearer
//! authentication. Rate limiting (429), server errors and transport
//! failures are retried with exponential backoff; other 4xx responses are
//! final.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use mfa_core::domain::value_objects::CodeNotice;
use mfa_core::services::{DispatchError, NotificationDispatcher};
use mfa_shared::utils::mask_email;

use super::template::EmailTemplate;
use crate::config::MailConfig;
use crate::InfrastructureError;

/// Largest provider error body echoed into a `DispatchError`
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct OutboundMail<'a> {
    from: Address<'a>,
    to: Vec<Address<'a>>,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

/// Dispatcher backed by an HTTP mail API
#[derive(Debug, Clone)]
pub struct HttpMailDispatcher {
    client: Client,
    endpoint: String,
    api_key: String,
    from_address: String,
    from_name: String,
    max_retries: u32,
    retry_delay_ms: u64,
    template: EmailTemplate,
}

impl HttpMailDispatcher {
    pub fn new(config: &MailConfig, template: EmailTemplate) -> Result<Self, InfrastructureError> {
        if config.http.endpoint.trim().is_empty() {
            return Err(InfrastructureError::Config(
                "MAIL_HTTP_ENDPOINT is required for the http mail provider".to_string(),
            ));
        }

        let endpoint = Url::parse(config.http.endpoint.trim())
            .map_err(|e| InfrastructureError::Config(format!("Invalid MAIL_HTTP_ENDPOINT: {}", e)))?;

        let mut builder = Client::builder().timeout(Duration::from_secs(config.http.request_timeout_secs));
        // Local relays and test stubs never go through an outbound proxy.
        if matches!(endpoint.host_str(), Some("localhost" | "127.0.0.1" | "[::1]")) {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: config.http.api_key.clone(),
            from_address: config.from_address.clone(),
            from_name: config.from_name.clone(),
            max_retries: config.max_retries.max(1),
            retry_delay_ms: config.retry_delay_ms,
            template,
        })
    }

    async fn send_with_retry(&self, payload: &OutboundMail<'_>, recipient: &str) -> Result<(), DispatchError> {
        let mut attempts = 0;
        let mut delay = Duration::from_millis(self.retry_delay_ms);

        loop {
            attempts += 1;
            debug!(
                "Sending verification mail attempt {}/{} to {}",
                attempts, self.max_retries, recipient
            );

            let mut request = self.client.post(&self.endpoint).json(payload);
            if !self.api_key.is_empty() {
                request = request.bearer_auth(&self.api_key);
            }

            let failure = match request.send().await {
                Ok(response) if response.status().is_success() => {
                    info!(
                        event = "mail_sent",
                        recipient = %recipient,
                        status = response.status().as_u16(),
                        attempts,
                        "Verification mail accepted by provider"
                    );
                    return Ok(());
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    let rejection = DispatchError::Rejected {
                        status: status.as_u16(),
                        message: truncate(&body, MAX_ERROR_BODY),
                    };

                    if !is_retriable_status(status) {
                        error!(
                            event = "mail_rejected",
                            recipient = %recipient,
                            status = status.as_u16(),
                            "Mail provider rejected the message"
                        );
                        return Err(rejection);
                    }
                    rejection
                }
                Err(e) => DispatchError::Transport {
                    message: e.to_string(),
                },
            };

            if attempts >= self.max_retries {
                error!(
                    event = "mail_failed",
                    recipient = %recipient,
                    attempts,
                    error = %failure,
                    "Giving up on verification mail"
                );
                return Err(failure);
            }

            warn!(
                "Mail delivery failed (attempt {}/{}): {}. Retrying in {:?}...",
                attempts, self.max_retries, failure, delay
            );
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(Duration::from_secs(5));
        }
    }
}

pub(crate) fn is_retriable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn truncate(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

#[async_trait]
impl NotificationDispatcher for HttpMailDispatcher {
    async fn dispatch(&self, notice: CodeNotice) -> Result<(), DispatchError> {
        let email = self.template.render(&notice);
        let payload = OutboundMail {
            from: Address {
                email: &self.from_address,
                name: Some(self.from_name.as_str()).filter(|n| !n.is_empty()),
            },
            to: vec![Address {
                email: &notice.recipient,
                name: notice.recipient_name.as_deref(),
            }],
            subject: &email.subject,
            text: &email.text_body,
            html: &email.html_body,
        };

        self.send_with_retry(&payload, &mask_email(&notice.recipient))
            .await
    }
}
