use actix_web::{http::StatusCode, HttpResponse};

use mfa_core::domain::value_objects::VerifyOutcome;
use mfa_core::errors::{DomainError, ValidationError};
use mfa_shared::error_codes;

use crate::dto::{internal_error, ErrorResponse, ErrorResponseExt};

/// Handle domain errors and convert them to appropriate HTTP responses
///
/// Store failures surface as 500 without leaking their cause; the full
/// error is logged.
pub fn handle_domain_error(error: DomainError) -> HttpResponse {
    match error {
        DomainError::Validation { message } => {
            ErrorResponse::new(error_codes::VALIDATION_ERROR, message).to_response(StatusCode::BAD_REQUEST)
        }
        DomainError::ValidationErr(err) => invalid_code_response(&err),
        DomainError::NotFound { resource } => {
            tracing::warn!(event = "resource_not_found", resource = %resource, "Verification record missing");
            ErrorResponse::new(error_codes::NOT_FOUND, "The requested resource was not found")
                .to_response(StatusCode::NOT_FOUND)
        }
        DomainError::Internal { message } => {
            tracing::error!(event = "internal_error", error = %message, "Verification request failed");
            internal_error()
        }
    }
}

/// 422 for a candidate that failed format validation
pub fn invalid_code_response(error: &ValidationError) -> HttpResponse {
    ErrorResponse::new(error_codes::VALIDATION_ERROR, error.to_string())
        .add_detail("field", "code")
        .to_response(StatusCode::UNPROCESSABLE_ENTITY)
}

/// Response for a code the guard checked and refused
pub fn rejection_response(outcome: VerifyOutcome) -> HttpResponse {
    let code = match outcome {
        VerifyOutcome::Expired => error_codes::VERIFICATION_CODE_EXPIRED,
        VerifyOutcome::NoActiveCode => error_codes::NO_ACTIVE_CODE,
        VerifyOutcome::Mismatch | VerifyOutcome::Success => error_codes::VERIFICATION_CODE_INVALID,
    };

    ErrorResponse::new(code, outcome.message())
        .add_detail("can_resend", outcome.suggests_resend())
        .to_response(StatusCode::BAD_REQUEST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_map_to_500() {
        let response = handle_domain_error(DomainError::internal("redis down"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_errors_map_to_client_errors() {
        let response = handle_domain_error(ValidationError::InvalidCodeFormat.into());
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = handle_domain_error(DomainError::Validation {
            message: "bad".to_string(),
        });
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_rejections_are_bad_requests() {
        assert_eq!(
            rejection_response(VerifyOutcome::Mismatch).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            rejection_response(VerifyOutcome::Expired).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
