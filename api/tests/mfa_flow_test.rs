//! End-to-end verification flow through the HTTP surface

mod common;

use actix_web::{http::StatusCode, test};
use chrono::Duration;
use serde_json::{json, Value};

use common::{bearer, harness, session_cookie, token, EMAIL};
use mfa_api::create_app;
use mfa_shared::MfaConfig;

#[actix_web::test]
async fn test_challenge_then_verify_unlocks_protected_route() {
    let h = harness(MfaConfig::default());
    let app = test::init_service(create_app(h.state.clone())).await;
    let auth = bearer(&token(h.user_id));

    // Gated request: challenged, code mailed, session cookie issued
    let req = test::TestRequest::get()
        .uri("/api/me?tab=profile")
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(resp.headers().get("location").unwrap(), "/2fa/verify");
    let cookie = session_cookie(&resp).expect("session cookie");

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VERIFICATION_REQUIRED");
    assert_eq!(body["details"]["verification"]["email"], "ja****oe@example.com");
    assert_eq!(body["details"]["verification"]["code_length"], 6);
    assert_eq!(h.dispatcher.sent_count().await, 1);

    // Opening the page while the code is live does not send another
    let req = test::TestRequest::get()
        .uri("/2fa/verify")
        .insert_header(auth.clone())
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["can_resend"], false);
    assert_eq!(h.dispatcher.sent_count().await, 1);

    // Wrong code
    let code = h.dispatcher.last_code_for(EMAIL).await.unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };
    let req = test::TestRequest::post()
        .uri("/2fa/verify")
        .insert_header(auth.clone())
        .cookie(cookie.clone())
        .set_json(json!({ "code": wrong }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VERIFICATION_CODE_INVALID");
    assert_eq!(body["message"], "Invalid verification code.");

    // Right code
    let req = test::TestRequest::post()
        .uri("/2fa/verify")
        .insert_header(auth.clone())
        .cookie(cookie.clone())
        .set_json(json!({ "code": code }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["redirect_to"], "/api/me?tab=profile");
    assert_eq!(body["message"], "Verification successful.");

    // Protected route now passes
    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header(auth.clone())
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["email"], EMAIL);

    // Replaying the consumed code fails
    let req = test::TestRequest::post()
        .uri("/2fa/verify")
        .insert_header(auth)
        .cookie(cookie)
        .set_json(json!({ "code": code }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NO_ACTIVE_CODE");
    assert_eq!(body["details"]["can_resend"], true);
}

#[actix_web::test]
async fn test_malformed_code_is_unprocessable() {
    let h = harness(MfaConfig::default());
    let app = test::init_service(create_app(h.state.clone())).await;
    let auth = bearer(&token(h.user_id));

    for code in ["12ab56", "12345", "1234567"] {
        let req = test::TestRequest::post()
            .uri("/2fa/verify")
            .insert_header(auth.clone())
            .set_json(json!({ "code": code }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "code {}", code);
    }

    let req = test::TestRequest::post()
        .uri("/2fa/verify")
        .insert_header(auth)
        .set_json(json!({ "code": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn test_resend_respects_cooldown() {
    let h = harness(MfaConfig::default());
    let app = test::init_service(create_app(h.state.clone())).await;
    let auth = bearer(&token(h.user_id));

    let req = test::TestRequest::get()
        .uri("/2fa/verify")
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = session_cookie(&resp).expect("session cookie");
    assert_eq!(h.dispatcher.sent_count().await, 1);

    h.clock.advance(Duration::seconds(30));
    let req = test::TestRequest::post()
        .uri("/2fa/resend")
        .insert_header(auth.clone())
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp.headers().get("retry-after").unwrap(), "30");
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "COOLDOWN_ACTIVE");
    assert_eq!(body["details"]["cooldown_remaining"], 30);
    assert_eq!(h.dispatcher.sent_count().await, 1);

    h.clock.advance(Duration::seconds(31));
    let req = test::TestRequest::post()
        .uri("/2fa/resend")
        .insert_header(auth)
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["cooldown_seconds"], 60);
    assert_eq!(h.dispatcher.sent_count().await, 2);
}

#[actix_web::test]
async fn test_reset_forces_new_challenge() {
    let h = harness(MfaConfig::default());
    let app = test::init_service(create_app(h.state.clone())).await;
    let auth = bearer(&token(h.user_id));

    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    let cookie = session_cookie(&resp).expect("session cookie");

    let code = h.dispatcher.last_code_for(EMAIL).await.unwrap();
    let req = test::TestRequest::post()
        .uri("/2fa/verify")
        .insert_header(auth.clone())
        .cookie(cookie.clone())
        .set_json(json!({ "code": code }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/2fa/reset")
        .insert_header(auth.clone())
        .cookie(cookie.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header(auth)
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_verification_lifetime_elapses() {
    let h = harness(MfaConfig::default().with_verification_lifetime(30));
    let app = test::init_service(create_app(h.state.clone())).await;
    let auth = bearer(&token(h.user_id));

    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    let cookie = session_cookie(&resp).expect("session cookie");

    let code = h.dispatcher.last_code_for(EMAIL).await.unwrap();
    let req = test::TestRequest::post()
        .uri("/2fa/verify")
        .insert_header(auth.clone())
        .cookie(cookie.clone())
        .set_json(json!({ "code": code }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    h.clock.advance(Duration::minutes(30));
    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header(auth.clone())
        .cookie(cookie.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    h.clock.advance(Duration::minutes(1));
    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header(auth)
        .cookie(cookie)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_disabled_gate_unmounts_routes_and_allows_access() {
    let h = harness(MfaConfig::disabled());
    let app = test::init_service(create_app(h.state.clone())).await;
    let auth = bearer(&token(h.user_id));

    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header(auth.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    assert_eq!(h.dispatcher.sent_count().await, 0);

    let req = test::TestRequest::get()
        .uri("/2fa/verify")
        .insert_header(auth)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_custom_route_prefix() {
    let mut config = MfaConfig::default();
    config.route_prefix = "/security/two-factor/".to_string();
    let h = harness(config);
    let app = test::init_service(create_app(h.state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header(bearer(&token(h.user_id)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.headers().get("location").unwrap(),
        "/security/two-factor/verify"
    );

    let req = test::TestRequest::get()
        .uri("/security/two-factor/verify")
        .insert_header(bearer(&token(h.user_id)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_health_and_not_found() {
    let h = harness(MfaConfig::default());
    let app = test::init_service(create_app(h.state.clone())).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(session_cookie(&resp).is_none());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");

    let req = test::TestRequest::get().uri("/nowhere").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
