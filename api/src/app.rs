//! Application factory
//!
//! Builds the actix-web application around an [`AppState`]. Verification
//! routes are mounted under the configured prefix only while the gate is
//! enabled; `/api` is the sample protected scope wrapped with the guard.

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, HttpResponse,
};
use tracing_actix_web::TracingLogger;

use mfa_core::repositories::{IdentityStore, SessionStore};
use mfa_core::services::NotificationDispatcher;
use mfa_shared::{error_codes, types::HealthResponse, ErrorResponse};

use crate::middleware::{AuthenticatedUser, JwtAuth, MfaGuard, SessionMiddleware};
use crate::routes::mfa::{resend::resend, reset::reset, show::show, verify::verify, AppState};

/// Create and configure the application with all dependencies
pub fn create_app<I, S, N>(
    app_state: web::Data<AppState<I, S, N>>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
>
where
    I: IdentityStore + ?Sized + 'static,
    S: SessionStore + ?Sized + 'static,
    N: NotificationDispatcher + ?Sized + 'static,
{
    let config = app_state.guard.config().clone();
    let verifier = app_state.verifier.clone();
    let session = app_state.session.clone();

    let mut app = App::new()
        .app_data(app_state.clone())
        .wrap(TracingLogger::default())
        .route("/health", web::get().to(health_check));

    if config.enabled {
        let prefix = config.route("");
        app = app.service(
            web::scope(prefix.trim_end_matches('/'))
                .wrap(JwtAuth::required(verifier.clone()))
                .wrap(SessionMiddleware::new(session.clone()))
                .route("/verify", web::get().to(show::<I, S, N>))
                .route("/verify", web::post().to(verify::<I, S, N>))
                .route("/resend", web::post().to(resend::<I, S, N>))
                .route("/reset", web::post().to(reset::<I, S, N>)),
        );
    }

    app.service(
        web::scope("/api")
            .wrap(MfaGuard::new(app_state))
            .wrap(JwtAuth::required(verifier))
            .wrap(SessionMiddleware::new(session))
            .route("/me", web::get().to(current_user)),
    )
    .default_service(web::route().to(not_found))
}

/// Health check endpoint handler
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse::healthy("mail2fa-api", env!("CARGO_PKG_VERSION")))
}

/// Sample protected resource: the authenticated principal
async fn current_user(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "user_id": user.0.user_id,
        "email": user.0.email,
        "name": user.0.name,
    }))
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        error_codes::NOT_FOUND,
        "The requested resource was not found",
    ))
}
