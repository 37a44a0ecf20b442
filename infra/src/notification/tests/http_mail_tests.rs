use mfa_core::domain::value_objects::CodeNotice;
use mfa_core::services::{DispatchError, NotificationDispatcher};
use mfa_shared::config::{MailConfig, MailProvider};

use super::StubServer;
use crate::notification::{EmailTemplate, HttpMailDispatcher};

fn dispatcher_for(endpoint: &str) -> HttpMailDispatcher {
    let mut config = MailConfig::default();
    config.provider = MailProvider::Http;
    config.from_address = "security@example.com".to_string();
    config.http.endpoint = endpoint.to_string();
    config.http.api_key = "test-key".to_string();
    config.max_retries = 3;
    config.retry_delay_ms = 1;

    HttpMailDispatcher::new(&config, EmailTemplate::new("Your Verification Code", "Acme")).unwrap()
}

fn notice() -> CodeNotice {
    CodeNotice::new("jane@example.com", "482913", 10).with_recipient_name(Some("Jane".to_string()))
}

#[tokio::test]
async fn test_posts_rendered_mail_with_bearer_token() {
    let server = StubServer::start(vec![202]).await;

    dispatcher_for(&server.url).dispatch(notice()).await.unwrap();

    assert_eq!(server.hits(), 1);
    let request = server.last_request().await;
    assert!(request.starts_with("POST /v1/send"));
    assert!(request.to_lowercase().contains("authorization: bearer test-key"));
    assert!(request.contains(r#""email":"jane@example.com""#));
    assert!(request.contains(r#""subject":"Your Verification Code""#));
    assert!(request.contains("482913"));
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = StubServer::start(vec![503, 200]).await;

    let result = dispatcher_for(&server.url).dispatch(notice()).await;

    assert!(result.is_ok());
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = StubServer::start(vec![400]).await;

    let result = dispatcher_for(&server.url).dispatch(notice()).await;

    match result {
        Err(DispatchError::Rejected { status, message }) => {
            assert_eq!(status, 400);
            assert!(message.contains("stub failure"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn test_rate_limit_exhausts_attempts() {
    let server = StubServer::start(vec![429, 429, 429, 429]).await;

    let result = dispatcher_for(&server.url).dispatch(notice()).await;

    assert!(matches!(result, Err(DispatchError::Rejected { status: 429, .. })));
    assert_eq!(server.hits(), 3);
}

#[tokio::test]
async fn test_unreachable_provider_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/v1/send", listener.local_addr().unwrap());
    drop(listener);

    let result = dispatcher_for(&endpoint).dispatch(notice()).await;

    assert!(matches!(result, Err(DispatchError::Transport { .. })));
}
