use actix_web::{web, HttpResponse};

use mfa_core::domain::entities::SessionContext;
use mfa_core::repositories::{IdentityStore, SessionStore};
use mfa_core::services::NotificationDispatcher;
use mfa_shared::ApiResponse;

use super::AppState;
use crate::dto::ResetResponse;
use crate::handlers::handle_domain_error;
use crate::middleware::{AuthenticatedUser, SessionId};

/// Handler for POST /{prefix}/reset
///
/// Clears verification for the session so the next guarded request is
/// challenged again. Intended for logout flows.
pub async fn reset<I, S, N>(
    state: web::Data<AppState<I, S, N>>,
    _user: AuthenticatedUser,
    session_id: SessionId,
) -> HttpResponse
where
    I: IdentityStore + ?Sized + 'static,
    S: SessionStore + ?Sized + 'static,
    N: NotificationDispatcher + ?Sized + 'static,
{
    let mut session = SessionContext::new(session_id.0);

    match state.guard.reset(&mut session).await {
        Ok(()) => HttpResponse::Ok().json(
            ApiResponse::success(ResetResponse { cleared: true })
                .with_message("Two-factor verification has been reset."),
        ),
        Err(e) => handle_domain_error(e),
    }
}
