//! Tests for the in-memory session store

use chrono::{Duration, Utc};

use crate::domain::entities::ThrottleState;
use crate::repositories::session::{InMemorySessionStore, SessionStore};

#[tokio::test]
async fn test_save_and_load() {
    let store = InMemorySessionStore::new();
    let now = Utc::now();
    let state = ThrottleState {
        last_sent_at: Some(now),
        verified_at: None,
        intended_url: Some("/reports".to_string()),
    };

    store.save("s1", &state).await.unwrap();
    assert_eq!(store.load("s1").await.unwrap(), state);
    assert_eq!(store.load("other").await.unwrap(), ThrottleState::default());
}

#[tokio::test]
async fn test_pull_intended_url_consumes_once() {
    let store = InMemorySessionStore::new();
    let state = ThrottleState {
        intended_url: Some("/reports".to_string()),
        ..Default::default()
    };
    store.save("s1", &state).await.unwrap();

    assert_eq!(
        store.pull_intended_url("s1").await.unwrap().as_deref(),
        Some("/reports")
    );
    assert_eq!(store.pull_intended_url("s1").await.unwrap(), None);
    assert_eq!(store.pull_intended_url("missing").await.unwrap(), None);
}

#[tokio::test]
async fn test_compare_and_set_last_sent_single_winner() {
    let store = InMemorySessionStore::new();
    let t0 = Utc::now();

    assert!(store.compare_and_set_last_sent("s1", None, t0).await.unwrap());
    // A second claimant still expecting an empty slot loses
    assert!(!store
        .compare_and_set_last_sent("s1", None, t0 + Duration::seconds(1))
        .await
        .unwrap());
    assert_eq!(store.load("s1").await.unwrap().last_sent_at, Some(t0));

    let t1 = t0 + Duration::seconds(61);
    assert!(store.compare_and_set_last_sent("s1", Some(t0), t1).await.unwrap());
    assert_eq!(store.load("s1").await.unwrap().last_sent_at, Some(t1));
}

#[tokio::test]
async fn test_clear_and_empty_save_remove_session() {
    let store = InMemorySessionStore::new();
    let state = ThrottleState {
        verified_at: Some(Utc::now()),
        ..Default::default()
    };
    store.save("s1", &state).await.unwrap();
    store.save("s2", &state).await.unwrap();
    assert_eq!(store.len().await, 2);

    store.clear("s1").await.unwrap();
    store.save("s2", &ThrottleState::default()).await.unwrap();
    assert!(store.is_empty().await);
}
