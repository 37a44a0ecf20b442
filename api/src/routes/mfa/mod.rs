//! Verification route handlers
//!
//! - `GET /{prefix}/verify`: page data, issuing a code if none is live
//! - `POST /{prefix}/verify`: submit a code
//! - `POST /{prefix}/resend`: request a new code
//! - `POST /{prefix}/reset`: drop verification for the session

pub mod resend;
pub mod reset;
pub mod show;
pub mod verify;

use std::sync::Arc;

use mfa_core::repositories::{IdentityStore, SessionStore};
use mfa_core::services::{AccessGuard, NotificationDispatcher};
use mfa_shared::SessionConfig;

use crate::middleware::TokenVerifier;

/// Application state shared by all handlers
///
/// Store parameters may be trait objects, which is how the binary wires
/// backends chosen at startup.
pub struct AppState<I: ?Sized, S: ?Sized, N: ?Sized> {
    pub guard: AccessGuard<I, S, N>,
    pub verifier: Arc<TokenVerifier>,
    pub session: SessionConfig,
}

impl<I, S, N> AppState<I, S, N>
where
    I: IdentityStore + ?Sized,
    S: SessionStore + ?Sized,
    N: NotificationDispatcher + ?Sized,
{
    pub fn new(guard: AccessGuard<I, S, N>, verifier: Arc<TokenVerifier>, session: SessionConfig) -> Self {
        Self {
            guard,
            verifier,
            session,
        }
    }
}
