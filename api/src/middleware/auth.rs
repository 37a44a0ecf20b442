//! Bearer token middleware resolving the authenticated identity.
//!
//! Login is owned upstream; this middleware only verifies the JWT it issued
//! and turns the claims into an [`Identity`] the guard can key on.
//!
//! The middleware can work in two modes:
//! 1. Required: requests without a valid token are answered with 401
//! 2. Optional: requests without a token pass through anonymously, which the
//!    verification guard treats as not applicable

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    http::header::AUTHORIZATION,
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::{
    future::{ready, Ready},
    rc::Rc,
    str::FromStr,
    sync::Arc,
    task::{Context, Poll},
};
use thiserror::Error;
use uuid::Uuid;

use mfa_core::domain::entities::Identity;
use mfa_shared::{error_codes, utils::is_valid_email, ErrorResponse, JwtConfig};

/// Claims carried by the upstream access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl Claims {
    /// Convert verified claims into the guard's principal
    pub fn into_identity(self) -> Result<Identity, AuthError> {
        let user_id = Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidSubject)?;
        if !is_valid_email(&self.email) {
            return Err(AuthError::InvalidEmail);
        }

        let identity = Identity::new(user_id, self.email);
        Ok(match self.name {
            Some(name) if !name.trim().is_empty() => identity.with_name(name),
            _ => identity,
        })
    }
}

/// Reasons a bearer token is refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing or invalid Authorization header")]
    MissingToken,

    #[error("Token verification failed: {0}")]
    InvalidToken(String),

    #[error("Token subject is not a user id")]
    InvalidSubject,

    #[error("Token carries no usable email address")]
    InvalidEmail,

    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Verifies tokens against the configured secret, issuer and audience
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &JwtConfig) -> Result<Self, AuthError> {
        let algorithm = Algorithm::from_str(&config.algorithm)
            .map_err(|_| AuthError::UnsupportedAlgorithm(config.algorithm.clone()))?;

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        if !config.issuer.is_empty() {
            validation.set_issuer(&[config.issuer.as_str()]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience.as_str()]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        data.claims.into_identity()
    }
}

/// Authentication middleware factory
#[derive(Clone)]
pub struct JwtAuth {
    verifier: Arc<TokenVerifier>,
    required: bool,
}

impl JwtAuth {
    /// Reject requests without a valid token
    pub fn required(verifier: Arc<TokenVerifier>) -> Self {
        Self {
            verifier,
            required: true,
        }
    }

    /// Let anonymous requests through; malformed tokens are still rejected
    pub fn optional(verifier: Arc<TokenVerifier>) -> Self {
        Self {
            verifier,
            required: false,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
            verifier: Arc::clone(&self.verifier),
            required: self.required,
        }))
    }
}

/// Authentication middleware service
pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
    verifier: Arc<TokenVerifier>,
    required: bool,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = Arc::clone(&self.verifier);
        let required = self.required;

        Box::pin(async move {
            let outcome = match extract_bearer_token(&req) {
                Some(token) => verifier.verify(&token).map(Some),
                None if required => Err(AuthError::MissingToken),
                None => Ok(None),
            };

            match outcome {
                Ok(Some(identity)) => {
                    req.extensions_mut().insert(identity);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        event = "token_rejected",
                        path = %req.path(),
                        reason = %e,
                        "Bearer token rejected"
                    );
                    let response = HttpResponse::Unauthorized()
                        .json(ErrorResponse::new(error_codes::UNAUTHORIZED, e.to_string()));
                    return Ok(req.into_response(response).map_into_right_body());
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Extracts Bearer token from Authorization header
fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extractor for a required authenticated user
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<Identity>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or_else(|| ErrorUnauthorized("Authentication required"));

        ready(result)
    }
}

/// Extractor for optional authentication
pub struct OptionalUser(pub Option<Identity>);

impl FromRequest for OptionalUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(Ok(OptionalUser(req.extensions().get::<Identity>().cloned())))
    }
}
