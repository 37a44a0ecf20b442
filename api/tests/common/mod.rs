//! Shared fixtures for the HTTP tests

#![allow(dead_code)]

use actix_web::{cookie::Cookie, dev::ServiceResponse, web};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::Arc;
use uuid::Uuid;

use mfa_api::middleware::{Claims, TokenVerifier};
use mfa_api::AppState;
use mfa_core::{AccessGuard, InMemoryIdentityStore, InMemorySessionStore, ManualClock, RecordingDispatcher};
use mfa_shared::{JwtConfig, MfaConfig, SessionConfig};

pub const SECRET: &str = "test-secret";
pub const EMAIL: &str = "jane.doe@example.com";

pub type TestState = AppState<InMemoryIdentityStore, InMemorySessionStore, RecordingDispatcher>;

pub struct Harness {
    pub state: web::Data<TestState>,
    pub clock: Arc<ManualClock>,
    pub dispatcher: RecordingDispatcher,
    pub user_id: Uuid,
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig::new(SECRET)
}

pub fn harness(config: MfaConfig) -> Harness {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let dispatcher = RecordingDispatcher::new();

    let guard = AccessGuard::new(
        Arc::new(InMemoryIdentityStore::new()),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(dispatcher.clone()),
        config.with_hash_cost(4),
    )
    .with_clock(clock.clone());

    let verifier = Arc::new(TokenVerifier::new(&jwt_config()).unwrap());
    let state = web::Data::new(AppState::new(guard, verifier, SessionConfig::default()));

    Harness {
        state,
        clock,
        dispatcher,
        user_id: Uuid::new_v4(),
    }
}

pub fn token_with(user_id: Uuid, exp_offset: Duration, issuer: &str) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        email: EMAIL.to_string(),
        name: Some("Jane".to_string()),
        exp: (Utc::now() + exp_offset).timestamp() as usize,
        iat: Some(Utc::now().timestamp() as usize),
        iss: Some(issuer.to_string()),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

pub fn token(user_id: Uuid) -> String {
    token_with(user_id, Duration::hours(1), "mail2fa")
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Session cookie set on a response, if any
pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SessionConfig::default().cookie_name)
        .map(|c| c.into_owned())
}
