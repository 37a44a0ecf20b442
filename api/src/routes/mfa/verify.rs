use actix_web::{web, HttpResponse};
use validator::Validate;

use mfa_core::domain::entities::SessionContext;
use mfa_core::domain::value_objects::{SubmitOutcome, VerifyOutcome};
use mfa_core::repositories::{IdentityStore, SessionStore};
use mfa_core::services::NotificationDispatcher;
use mfa_shared::{error_codes, ApiResponse};

use super::AppState;
use crate::dto::{unauthenticated, ErrorResponse, ErrorResponseExt, VerifiedResponse, VerifyCodeRequest};
use crate::handlers::{handle_domain_error, invalid_code_response, rejection_response};
use crate::middleware::{AuthenticatedUser, SessionId};

/// Handler for POST /{prefix}/verify
///
/// # Request Body
///
/// ```json
/// { "code": "482913" }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// `data.redirect_to` holds the resource captured before the challenge,
/// `/` when there was none.
///
/// ## Errors
/// - 400 Bad Request: missing code, wrong code, expired code or no active code
/// - 422 Unprocessable Entity: code of the wrong length or with non-digits
/// - 500 Internal Server Error: store failure
pub async fn verify<I, S, N>(
    state: web::Data<AppState<I, S, N>>,
    user: AuthenticatedUser,
    session_id: SessionId,
    request: web::Json<VerifyCodeRequest>,
) -> HttpResponse
where
    I: IdentityStore + ?Sized + 'static,
    S: SessionStore + ?Sized + 'static,
    N: NotificationDispatcher + ?Sized + 'static,
{
    if let Err(errors) = request.validate() {
        return ErrorResponse::new(error_codes::VALIDATION_ERROR, "Invalid request data")
            .add_detail("validation_errors", &errors)
            .to_response(actix_web::http::StatusCode::BAD_REQUEST);
    }

    let mut session = SessionContext::new(session_id.0);
    let candidate = request.code.trim();

    match state.guard.submit_code(Some(&user.0), &mut session, candidate).await {
        Ok(SubmitOutcome::Verified { redirect_to }) => HttpResponse::Ok().json(
            ApiResponse::success(VerifiedResponse { redirect_to })
                .with_message(VerifyOutcome::Success.message()),
        ),
        Ok(SubmitOutcome::Invalid(err)) => invalid_code_response(&err),
        Ok(SubmitOutcome::Rejected(outcome)) => rejection_response(outcome),
        Ok(SubmitOutcome::NotApplicable) => unauthenticated(),
        Err(e) => handle_domain_error(e),
    }
}
