//! Redis-backed session store
//!
//! Each session is one hash under `{prefix}:session:{id}` whose TTL tracks
//! the session timeout. Timestamps are stored as RFC 3339 strings with
//! microsecond precision so that a value read back and written as the
//! compare-and-set `expected` argument matches byte for byte.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use redis::Script;
use std::collections::HashMap;
use tracing::debug;

use mfa_core::domain::entities::ThrottleState;
use mfa_core::errors::DomainError;
use mfa_core::repositories::SessionStore;

use super::RedisClient;
use crate::InfrastructureError;

const LAST_SENT_FIELD: &str = "last_sent_at";
const INTENDED_URL_FIELD: &str = "intended_url";

/// ARGV: field, expected ('' for absent), new value, ttl seconds
static CAS_LAST_SENT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        local current = redis.call('HGET', KEYS[1], ARGV[1])
        if (current == false and ARGV[2] == '') or current == ARGV[2] then
            redis.call('HSET', KEYS[1], ARGV[1], ARGV[3])
            redis.call('EXPIRE', KEYS[1], tonumber(ARGV[4]))
            return 1
        end
        return 0
        ",
    )
});

/// ARGV: field
static PULL_FIELD: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        local value = redis.call('HGET', KEYS[1], ARGV[1])
        if value then
            redis.call('HDEL', KEYS[1], ARGV[1])
        end
        return value
        ",
    )
});

/// Session store keeping throttle state in Redis hashes
#[derive(Clone)]
pub struct RedisSessionStore {
    client: RedisClient,
    /// Hash field holding the verification timestamp
    verified_field: String,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    /// `verified_field` is the configured session key (`mail2fa_verified` by default)
    pub fn new(client: RedisClient, verified_field: impl Into<String>, ttl_seconds: u64) -> Self {
        Self {
            client,
            verified_field: verified_field.into(),
            ttl_seconds,
        }
    }

    fn key(&self, session_id: &str) -> String {
        self.client.make_key(&format!("session:{}", session_id))
    }
}

/// Flatten a state into hash fields, skipping unset values
pub(crate) fn encode_state(state: &ThrottleState, verified_field: &str) -> Vec<(String, String)> {
    let mut fields = Vec::with_capacity(3);
    if let Some(sent) = state.last_sent_at {
        fields.push((LAST_SENT_FIELD.to_string(), encode_timestamp(sent)));
    }
    if let Some(verified) = state.verified_at {
        fields.push((verified_field.to_string(), encode_timestamp(verified)));
    }
    if let Some(url) = &state.intended_url {
        fields.push((INTENDED_URL_FIELD.to_string(), url.clone()));
    }
    fields
}

pub(crate) fn decode_state(
    fields: &HashMap<String, String>,
    verified_field: &str,
) -> Result<ThrottleState, InfrastructureError> {
    Ok(ThrottleState {
        last_sent_at: fields
            .get(LAST_SENT_FIELD)
            .map(|v| decode_timestamp(v))
            .transpose()?,
        verified_at: fields
            .get(verified_field)
            .map(|v| decode_timestamp(v))
            .transpose()?,
        intended_url: fields.get(INTENDED_URL_FIELD).cloned(),
    })
}

pub(crate) fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, InfrastructureError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| InfrastructureError::Corrupt(format!("bad session timestamp '{}': {}", raw, e)))
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, session_id: &str) -> Result<ThrottleState, DomainError> {
        let fields = self.client.read_hash(&self.key(session_id)).await?;
        Ok(decode_state(&fields, &self.verified_field)?)
    }

    async fn save(&self, session_id: &str, state: &ThrottleState) -> Result<(), DomainError> {
        let fields = encode_state(state, &self.verified_field);
        self.client
            .replace_hash(&self.key(session_id), &fields, self.ttl_seconds)
            .await?;
        Ok(())
    }

    async fn compare_and_set_last_sent(
        &self,
        session_id: &str,
        expected: Option<DateTime<Utc>>,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let args = vec![
            LAST_SENT_FIELD.to_string(),
            expected.map(encode_timestamp).unwrap_or_default(),
            encode_timestamp(sent_at),
            self.ttl_seconds.to_string(),
        ];

        // A retried call whose first attempt landed reports a lost claim,
        // which only suppresses one resend.
        let applied: i64 = self
            .client
            .run_script(&CAS_LAST_SENT, &self.key(session_id), &args)
            .await?;

        debug!(
            event = "session_send_slot",
            claimed = applied == 1,
            "Resend slot claim evaluated"
        );
        Ok(applied == 1)
    }

    async fn pull_intended_url(&self, session_id: &str) -> Result<Option<String>, DomainError> {
        let url: Option<String> = self
            .client
            .run_script(
                &PULL_FIELD,
                &self.key(session_id),
                &[INTENDED_URL_FIELD.to_string()],
            )
            .await?;
        Ok(url)
    }

    async fn clear(&self, session_id: &str) -> Result<(), DomainError> {
        self.client.delete(&self.key(session_id)).await?;
        Ok(())
    }
}
