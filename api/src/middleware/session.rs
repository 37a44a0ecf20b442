//! Session cookie middleware.
//!
//! Throttle state is keyed by an opaque per-browser session id. The id is
//! read from the configured cookie or minted on first contact, exposed to
//! handlers through [`SessionId`], and written back on the response when new.

use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorInternalServerError,
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    task::{Context, Poll},
};
use uuid::Uuid;

use mfa_shared::SessionConfig;

/// Longest session id accepted from a client cookie
const MAX_SESSION_ID_LEN: usize = 128;

/// Session id attached to the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn generate() -> Self {
        SessionId(Uuid::new_v4().simple().to_string())
    }

    /// Accept a client-supplied id only if it looks like one we minted
    fn from_cookie(value: &str) -> Option<Self> {
        let valid = !value.is_empty()
            && value.len() <= MAX_SESSION_ID_LEN
            && value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        valid.then(|| SessionId(value.to_string()))
    }
}

impl FromRequest for SessionId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<SessionId>()
            .cloned()
            .ok_or_else(|| ErrorInternalServerError("Session middleware not installed"));
        ready(result)
    }
}

/// Session middleware factory
#[derive(Clone)]
pub struct SessionMiddleware {
    config: Rc<SessionConfig>,
}

impl SessionMiddleware {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config: Rc::new(config),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddlewareService {
            service: Rc::new(service),
            config: Rc::clone(&self.config),
        }))
    }
}

pub struct SessionMiddlewareService<S> {
    service: Rc<S>,
    config: Rc<SessionConfig>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let config = Rc::clone(&self.config);

        Box::pin(async move {
            let existing = req
                .cookie(&config.cookie_name)
                .and_then(|c| SessionId::from_cookie(c.value()));

            let (session_id, is_new) = match existing {
                Some(id) => (id, false),
                None => (SessionId::generate(), true),
            };
            req.extensions_mut().insert(session_id.clone());

            let mut res = service.call(req).await?;

            if is_new {
                let cookie = build_cookie(&config, session_id.as_str());
                if let Err(e) = res.response_mut().add_cookie(&cookie) {
                    tracing::error!(error = %e, "Failed to set session cookie");
                }
            }
            Ok(res)
        })
    }
}

fn build_cookie(config: &SessionConfig, value: &str) -> Cookie<'static> {
    Cookie::build(config.cookie_name.clone(), value.to_string())
        .path("/")
        .http_only(config.http_only)
        .secure(config.secure)
        .same_site(parse_same_site(&config.same_site))
        .max_age(CookieDuration::seconds(config.timeout as i64))
        .finish()
}

fn parse_same_site(value: &str) -> SameSite {
    match value.to_ascii_lowercase().as_str() {
        "strict" => SameSite::Strict,
        "none" => SameSite::None,
        _ => SameSite::Lax,
    }
}
