//! End-to-end flow through the public API of the core crate

use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

use mfa_core::{
    AccessDecision, AccessGuard, Identity, InMemoryIdentityStore, InMemorySessionStore,
    ManualClock, RecordingDispatcher, ResendOutcome, SessionContext, SubmitOutcome,
    VerifyOutcome,
};
use mfa_shared::MfaConfig;

#[tokio::test]
async fn test_challenge_resend_verify_cycle() {
    let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
    let clock = Arc::new(ManualClock::new(t0));
    let dispatcher = Arc::new(RecordingDispatcher::new());

    let config = MfaConfig::default()
        .with_hash_cost(4)
        .with_code_length(8)
        .with_verification_lifetime(60);

    let guard = AccessGuard::new(
        Arc::new(InMemoryIdentityStore::new()),
        Arc::new(InMemorySessionStore::new()),
        dispatcher.clone(),
        config,
    )
    .with_clock(clock.clone());

    let user = Identity::new(Uuid::new_v4(), "ab@x.com");
    let mut session = SessionContext::new("browser-1");

    // Gated request: challenged, code mailed
    let decision = guard
        .evaluate_access(Some(&user), &mut session, Some("/admin/users"))
        .await
        .unwrap();
    let AccessDecision::Challenge(challenge) = decision else {
        panic!("expected a challenge");
    };
    assert_eq!(challenge.masked_identity, "a*@x.com");
    assert_eq!(challenge.code_length, 8);

    let first_code = dispatcher.last_code_for("ab@x.com").await.unwrap();
    assert_eq!(first_code.len(), 8);
    assert_eq!(dispatcher.notices().await[0].greeting_name(), "there");

    // Impatient resend is bounced
    clock.advance(Duration::seconds(15));
    assert_eq!(
        guard.request_resend(Some(&user), &mut session).await.unwrap(),
        ResendOutcome::CooldownActive {
            remaining_seconds: 45
        }
    );

    // After the cooldown a fresh code replaces the old one
    clock.advance(Duration::seconds(45));
    assert!(matches!(
        guard.request_resend(Some(&user), &mut session).await.unwrap(),
        ResendOutcome::Sent { .. }
    ));
    let second_code = dispatcher.last_code_for("ab@x.com").await.unwrap();

    if first_code != second_code {
        assert_eq!(
            guard
                .submit_code(Some(&user), &mut session, &first_code)
                .await
                .unwrap(),
            SubmitOutcome::Rejected(VerifyOutcome::Mismatch)
        );
    }

    assert_eq!(
        guard
            .submit_code(Some(&user), &mut session, &second_code)
            .await
            .unwrap(),
        SubmitOutcome::Verified {
            redirect_to: "/admin/users".to_string()
        }
    );

    clock.advance(Duration::minutes(59));
    assert_eq!(
        guard
            .evaluate_access(Some(&user), &mut session, None)
            .await
            .unwrap(),
        AccessDecision::Allow
    );

    clock.advance(Duration::minutes(2));
    assert!(matches!(
        guard
            .evaluate_access(Some(&user), &mut session, None)
            .await
            .unwrap(),
        AccessDecision::Challenge(_)
    ));
}
