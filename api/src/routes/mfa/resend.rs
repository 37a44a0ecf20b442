use actix_web::{http::header::RETRY_AFTER, web, HttpResponse};

use mfa_core::domain::entities::SessionContext;
use mfa_core::domain::value_objects::ResendOutcome;
use mfa_core::repositories::{IdentityStore, SessionStore};
use mfa_core::services::NotificationDispatcher;
use mfa_shared::{error_codes, ApiResponse};

use super::AppState;
use crate::dto::{unauthenticated, ErrorResponse, ResendResponse};
use crate::handlers::handle_domain_error;
use crate::middleware::{AuthenticatedUser, SessionId};

/// Handler for POST /{prefix}/resend
///
/// ## Errors
/// - 429 Too Many Requests: cooldown still running; `Retry-After` and
///   `details.cooldown_remaining` carry the seconds left
/// - 500 Internal Server Error: store failure
pub async fn resend<I, S, N>(
    state: web::Data<AppState<I, S, N>>,
    user: AuthenticatedUser,
    session_id: SessionId,
) -> HttpResponse
where
    I: IdentityStore + ?Sized + 'static,
    S: SessionStore + ?Sized + 'static,
    N: NotificationDispatcher + ?Sized + 'static,
{
    let mut session = SessionContext::new(session_id.0);

    match state.guard.request_resend(Some(&user.0), &mut session).await {
        Ok(outcome @ ResendOutcome::Sent { cooldown_seconds }) => HttpResponse::Ok().json(
            ApiResponse::success(ResendResponse { cooldown_seconds }).with_message(outcome.message()),
        ),
        Ok(outcome @ ResendOutcome::CooldownActive { remaining_seconds }) => {
            HttpResponse::TooManyRequests()
                .insert_header((RETRY_AFTER, remaining_seconds.to_string()))
                .json(
                    ErrorResponse::new(error_codes::COOLDOWN_ACTIVE, outcome.message())
                        .add_detail("cooldown_remaining", remaining_seconds),
                )
        }
        Ok(ResendOutcome::NotApplicable) => unauthenticated(),
        Err(e) => handle_domain_error(e),
    }
}
