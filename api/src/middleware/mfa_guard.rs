//! Middleware gating routes behind email verification.
//!
//! Wrap any scope or route with [`MfaGuard`] to require a verified session.
//! It must sit inside [`SessionMiddleware`](super::SessionMiddleware) and an
//! optional or required [`JwtAuth`](super::JwtAuth): anonymous requests are
//! passed through untouched.

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::{
        header::{HeaderValue, LOCATION},
        StatusCode,
    },
    web, Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    task::{Context, Poll},
};

use mfa_core::domain::entities::{Identity, SessionContext};
use mfa_core::domain::value_objects::AccessDecision;
use mfa_core::repositories::{IdentityStore, SessionStore};
use mfa_core::services::NotificationDispatcher;
use mfa_shared::error_codes;

use super::SessionId;
use crate::dto::{internal_error, page_payload, ErrorResponse, ErrorResponseExt};
use crate::handlers::handle_domain_error;
use crate::routes::mfa::AppState;

/// Verification guard middleware factory
pub struct MfaGuard<I: ?Sized, S: ?Sized, N: ?Sized> {
    state: web::Data<AppState<I, S, N>>,
}

impl<I: ?Sized, S: ?Sized, N: ?Sized> MfaGuard<I, S, N> {
    pub fn new(state: web::Data<AppState<I, S, N>>) -> Self {
        Self { state }
    }
}

impl<I: ?Sized, S: ?Sized, N: ?Sized> Clone for MfaGuard<I, S, N> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<Svc, B, I, S, N> Transform<Svc, ServiceRequest> for MfaGuard<I, S, N>
where
    Svc: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    Svc::Future: 'static,
    B: 'static,
    I: IdentityStore + ?Sized + 'static,
    S: SessionStore + ?Sized + 'static,
    N: NotificationDispatcher + ?Sized + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = MfaGuardMiddleware<Svc, I, S, N>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: Svc) -> Self::Future {
        ready(Ok(MfaGuardMiddleware {
            service: Rc::new(service),
            state: self.state.clone(),
        }))
    }
}

pub struct MfaGuardMiddleware<Svc, I: ?Sized, S: ?Sized, N: ?Sized> {
    service: Rc<Svc>,
    state: web::Data<AppState<I, S, N>>,
}

impl<Svc, B, I, S, N> Service<ServiceRequest> for MfaGuardMiddleware<Svc, I, S, N>
where
    Svc: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    Svc::Future: 'static,
    B: 'static,
    I: IdentityStore + ?Sized + 'static,
    S: SessionStore + ?Sized + 'static,
    N: NotificationDispatcher + ?Sized + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let state = self.state.clone();

        Box::pin(async move {
            let identity = req.extensions().get::<Identity>().cloned();
            let session_id = req.extensions().get::<SessionId>().cloned();

            let Some(session_id) = session_id else {
                tracing::error!(path = %req.path(), "Verification guard installed without session middleware");
                return Ok(req.into_response(internal_error()).map_into_right_body());
            };

            let requested_url = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string());

            let mut session = SessionContext::new(session_id.0);
            let decision = state
                .guard
                .evaluate_access(identity.as_ref(), &mut session, requested_url.as_deref())
                .await;

            match decision {
                Ok(AccessDecision::Allow) | Ok(AccessDecision::NotApplicable) => {
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Ok(AccessDecision::Challenge(challenge)) => {
                    let verify_url = state.guard.config().route("verify");
                    let body = ErrorResponse::new(
                        error_codes::VERIFICATION_REQUIRED,
                        "Two-factor verification required",
                    )
                    .add_detail("verify_url", &verify_url)
                    .add_detail("verification", page_payload(challenge));

                    let mut response = body.to_response(StatusCode::FORBIDDEN);
                    if let Ok(value) = HeaderValue::from_str(&verify_url) {
                        response.headers_mut().insert(LOCATION, value);
                    }
                    Ok(req.into_response(response).map_into_right_body())
                }
                Err(e) => Ok(req.into_response(handle_domain_error(e)).map_into_right_body()),
            }
        })
    }
}
