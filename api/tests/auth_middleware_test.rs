//! Integration tests for the bearer token, session and guard middleware

mod common;

use actix_web::{http::StatusCode, test, web, App, HttpResponse};
use chrono::Duration;
use serde_json::Value;
use std::sync::Arc;

use common::{bearer, harness, jwt_config, session_cookie, token, token_with};
use mfa_api::middleware::{AuthenticatedUser, JwtAuth, MfaGuard, OptionalUser, SessionId, SessionMiddleware, TokenVerifier};
use mfa_shared::{MfaConfig, SessionConfig};

fn verifier() -> Arc<TokenVerifier> {
    Arc::new(TokenVerifier::new(&jwt_config()).unwrap())
}

async fn whoami(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "email": user.0.email }))
}

#[actix_web::test]
async fn test_middleware_requires_auth_header() {
    let app = test::init_service(
        App::new()
            .wrap(JwtAuth::required(verifier()))
            .route("/protected", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get().uri("/protected").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[actix_web::test]
async fn test_middleware_rejects_bad_tokens() {
    let app = test::init_service(
        App::new()
            .wrap(JwtAuth::required(verifier()))
            .route("/protected", web::get().to(whoami)),
    )
    .await;
    let user_id = uuid::Uuid::new_v4();

    let cases = [
        "invalid-token".to_string(),
        token_with(user_id, Duration::hours(-2), "mail2fa"),
        token_with(user_id, Duration::hours(1), "someone-else"),
    ];

    for bad in cases {
        let req = test::TestRequest::get()
            .uri("/protected")
            .insert_header(bearer(&bad))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}

#[actix_web::test]
async fn test_valid_token_exposes_identity() {
    let app = test::init_service(
        App::new()
            .wrap(JwtAuth::required(verifier()))
            .route("/protected", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/protected")
        .insert_header(bearer(&token(uuid::Uuid::new_v4())))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["email"], common::EMAIL);
}

#[actix_web::test]
async fn test_optional_auth_lets_anonymous_through() {
    async fn maybe(user: OptionalUser) -> HttpResponse {
        HttpResponse::Ok().body(if user.0.is_some() { "user" } else { "anonymous" })
    }

    let app = test::init_service(
        App::new()
            .wrap(JwtAuth::optional(verifier()))
            .route("/open", web::get().to(maybe)),
    )
    .await;

    let req = test::TestRequest::get().uri("/open").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await, "anonymous");

    let req = test::TestRequest::get()
        .uri("/open")
        .insert_header(bearer("garbage"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_session_cookie_is_issued_once() {
    async fn echo(session: SessionId) -> HttpResponse {
        HttpResponse::Ok().body(session.0)
    }

    let app = test::init_service(
        App::new()
            .wrap(SessionMiddleware::new(SessionConfig::default()))
            .route("/echo", web::get().to(echo)),
    )
    .await;

    let req = test::TestRequest::get().uri("/echo").to_request();
    let resp = test::call_service(&app, req).await;
    let cookie = session_cookie(&resp).expect("session cookie");
    let first = test::read_body(resp).await;
    assert_eq!(first, cookie.value());

    let req = test::TestRequest::get()
        .uri("/echo")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(session_cookie(&resp).is_none());
    assert_eq!(test::read_body(resp).await, cookie.value());
}

#[actix_web::test]
async fn test_guard_ignores_anonymous_requests() {
    let h = harness(MfaConfig::default());

    let app = test::init_service(
        App::new().service(
            web::scope("/reports")
                .wrap(MfaGuard::new(h.state.clone()))
                .wrap(JwtAuth::optional(verifier()))
                .wrap(SessionMiddleware::new(SessionConfig::default()))
                .route("", web::get().to(|| async { HttpResponse::Ok().body("public view") })),
        ),
    )
    .await;

    let req = test::TestRequest::get().uri("/reports").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(h.dispatcher.sent_count().await, 0);

    let req = test::TestRequest::get()
        .uri("/reports")
        .insert_header(bearer(&token(h.user_id)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(h.dispatcher.sent_count().await, 1);
}

#[actix_web::test]
async fn test_guard_without_session_middleware_fails_closed() {
    let h = harness(MfaConfig::default());

    let app = test::init_service(
        App::new().service(
            web::scope("/reports")
                .wrap(MfaGuard::new(h.state.clone()))
                .wrap(JwtAuth::required(verifier()))
                .route("", web::get().to(|| async { HttpResponse::Ok().finish() })),
        ),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/reports")
        .insert_header(bearer(&token(h.user_id)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
