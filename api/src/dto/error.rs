//! Error bodies rendered by the verification endpoints

use actix_web::{http::StatusCode, HttpResponse};
pub use mfa_shared::errors::ErrorResponse;
use mfa_shared::error_codes;

/// actix-web helpers for [`ErrorResponse`]
pub trait ErrorResponseExt {
    fn to_response(&self, status: StatusCode) -> HttpResponse;
}

impl ErrorResponseExt for ErrorResponse {
    fn to_response(&self, status: StatusCode) -> HttpResponse {
        HttpResponse::build(status).json(self)
    }
}

/// 401 for requests that reached a verification endpoint without an identity
pub fn unauthenticated() -> HttpResponse {
    ErrorResponse::new(error_codes::UNAUTHORIZED, "Authentication required")
        .to_response(StatusCode::UNAUTHORIZED)
}

/// 500 with a generic message; details stay in the logs
pub fn internal_error() -> HttpResponse {
    ErrorResponse::new(error_codes::INTERNAL_ERROR, "An internal error occurred")
        .to_response(StatusCode::INTERNAL_SERVER_ERROR)
}
