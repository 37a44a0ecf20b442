//! Unit tests for throttle state and session context

use chrono::Utc;

use crate::domain::entities::throttle_state::{SessionContext, ThrottleState};

#[test]
fn test_new_session_context_is_empty() {
    let ctx = SessionContext::new("sess-1");
    assert_eq!(ctx.session_id, "sess-1");
    assert!(ctx.state.is_empty());
}

#[test]
fn test_state_deserializes_with_missing_fields() {
    let state: ThrottleState = serde_json::from_str(r#"{"intended_url":"/billing"}"#).unwrap();
    assert_eq!(state.intended_url.as_deref(), Some("/billing"));
    assert!(state.last_sent_at.is_none());
    assert!(state.verified_at.is_none());
    assert!(!state.is_empty());

    let marked = ThrottleState {
        verified_at: Some(Utc::now()),
        ..Default::default()
    };
    assert!(!marked.is_empty());
}
