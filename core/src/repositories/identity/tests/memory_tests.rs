//! Tests for the in-memory identity store

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::VerificationRecord;
use crate::repositories::identity::{IdentityStore, InMemoryIdentityStore};

#[tokio::test]
async fn test_unknown_user_reads_empty() {
    let store = InMemoryIdentityStore::new();
    let record = store.load_record(Uuid::new_v4()).await.unwrap();
    assert_eq!(record, VerificationRecord::empty());
}

#[tokio::test]
async fn test_store_overwrites() {
    let store = InMemoryIdentityStore::new();
    let user = Uuid::new_v4();
    let expires = Utc::now() + Duration::minutes(10);

    store
        .store_record(user, &VerificationRecord::active("first", expires))
        .await
        .unwrap();
    store
        .store_record(user, &VerificationRecord::active("second", expires))
        .await
        .unwrap();

    let record = store.load_record(user).await.unwrap();
    assert_eq!(record.code_hash(), Some("second"));
    assert_eq!(store.active_count().await, 1);
}

#[tokio::test]
async fn test_compare_and_swap() {
    let store = InMemoryIdentityStore::new();
    let user = Uuid::new_v4();
    let expires = Utc::now() + Duration::minutes(10);
    store
        .store_record(user, &VerificationRecord::active("hash-a", expires))
        .await
        .unwrap();

    // Stale expectation loses
    let swapped = store
        .compare_and_swap(user, Some("hash-b"), &VerificationRecord::empty())
        .await
        .unwrap();
    assert!(!swapped);
    assert!(store.load_record(user).await.unwrap().has_active_code());

    // Matching expectation wins exactly once
    let swapped = store
        .compare_and_swap(user, Some("hash-a"), &VerificationRecord::empty())
        .await
        .unwrap();
    assert!(swapped);
    let again = store
        .compare_and_swap(user, Some("hash-a"), &VerificationRecord::empty())
        .await
        .unwrap();
    assert!(!again);

    // `None` matches a cleared record
    let from_empty = store
        .compare_and_swap(user, None, &VerificationRecord::active("hash-c", expires))
        .await
        .unwrap();
    assert!(from_empty);
}
