use actix_web::{web, HttpResponse};

use mfa_core::domain::entities::SessionContext;
use mfa_core::domain::value_objects::AccessDecision;
use mfa_core::repositories::{IdentityStore, SessionStore};
use mfa_core::services::NotificationDispatcher;
use mfa_shared::ApiResponse;

use super::AppState;
use crate::dto::{page_payload, unauthenticated, VerificationStatus};
use crate::handlers::handle_domain_error;
use crate::middleware::{AuthenticatedUser, SessionId};

/// Handler for GET /{prefix}/verify
///
/// Returns the data the verification form needs. Opening the page issues
/// and sends a code when none is live, so a user arriving here directly
/// still receives one.
///
/// # Response
///
/// ## Pending (200 OK)
/// ```json
/// {
///     "success": true,
///     "data": {
///         "status": "pending",
///         "email": "ja**ne@example.com",
///         "expires_at": "2025-01-01T10:10:00Z",
///         "can_resend": false,
///         "resend_cooldown": 60,
///         "code_length": 6
///     }
/// }
/// ```
///
/// ## Already verified (200 OK)
/// `data.status` is `"verified"`.
pub async fn show<I, S, N>(
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

    match state.guard.evaluate_access(Some(&user.0), &mut session, None).await {
        Ok(AccessDecision::Challenge(challenge)) => HttpResponse::Ok().json(ApiResponse::success(
            VerificationStatus::Pending(page_payload(challenge)),
        )),
        Ok(AccessDecision::Allow) => HttpResponse::Ok().json(
            ApiResponse::success(VerificationStatus::Verified).with_message("Session already verified."),
        ),
        Ok(AccessDecision::NotApplicable) => unauthenticated(),
        Err(e) => handle_domain_error(e),
    }
}
