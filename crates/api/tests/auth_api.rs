//! HTTP-level integration tests for sign-up, sign-in and identity resolution.

mod common;

use axum::http::header::WWW_AUTHENTICATE;
use axum::http::StatusCode;
use common::{
    body_json, build_test_app, get, get_auth, post_json, post_sign_in, put_json_auth, sign_up,
    sign_up_and_sign_in, TEST_PASSWORD,
};
use assert_matches::assert_matches;
use stock_api::auth::jwt::{generate_access_token, generate_access_token_at, validate_token_at};
use stock_core::error::CoreError;

// ---------------------------------------------------------------------------
// Sign-up
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sign_up_returns_created_user_without_hash() {
    let app = build_test_app();
    let json = sign_up(&app.router, "Ana", "ana@example.com").await;

    assert!(json["id"].is_number());
    assert_eq!(json["name"], "Ana");
    assert_eq!(json["email"], "ana@example.com");
    assert_eq!(json["avatar"], "");
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_email_is_conflict() {
    let app = build_test_app();
    sign_up(&app.router, "Ana", "ana@example.com").await;

    let body = serde_json::json!({
        "name": "Other",
        "email": "ana@example.com",
        "password": TEST_PASSWORD,
        "confirm_password": TEST_PASSWORD,
    });
    let response = post_json(&app.router, "/api/v1/users/signup", body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "E-mail already exists");
}

#[tokio::test]
async fn mismatched_confirmation_is_bad_request() {
    let app = build_test_app();
    let body = serde_json::json!({
        "name": "Ana",
        "email": "ana@example.com",
        "password": TEST_PASSWORD,
        "confirm_password": "something-else-entirely",
    });
    let response = post_json(&app.router, "/api/v1/users/signup", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Sign-in
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sign_in_returns_bearer_token_usable_on_me() {
    let app = build_test_app();
    let (user, token) = sign_up_and_sign_in(&app.router, "ana@example.com").await;

    let response = get_auth(&app.router, "/api/v1/users/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = body_json(response).await;
    assert_eq!(me["id"], user["id"]);
    assert_eq!(me["email"], "ana@example.com");
}

#[tokio::test]
async fn sign_in_reports_token_type_bearer() {
    let app = build_test_app();
    sign_up(&app.router, "Ana", "ana@example.com").await;

    let response = post_sign_in(&app.router, "ana@example.com", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["token_type"], "bearer");
    assert!(json["access_token"].is_string());
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = build_test_app();
    sign_up(&app.router, "Ana", "ana@example.com").await;

    let wrong = post_sign_in(&app.router, "ana@example.com", "not-the-password").await;
    assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);
    let wrong = body_json(wrong).await;

    let unknown = post_sign_in(&app.router, "nobody@example.com", TEST_PASSWORD).await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
    let unknown = body_json(unknown).await;

    assert_eq!(wrong["error"], "Invalid credentials");
    assert_eq!(wrong, unknown);
}

// ---------------------------------------------------------------------------
// Identity resolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_token_is_unauthorized_with_challenge() {
    let app = build_test_app();
    let response = get(&app.router, "/api/v1/users/me").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = build_test_app();
    let response = get_auth(&app.router, "/api/v1/users/me", "not.a.jwt").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
}

#[tokio::test]
async fn signed_in_token_expires_after_ttl() {
    let app = build_test_app();
    let before = chrono::Utc::now().timestamp();
    let (user, token) = sign_up_and_sign_in(&app.router, "ana@example.com").await;
    let after = chrono::Utc::now().timestamp();

    let jwt = &app.state.config.jwt;
    let ttl = jwt.access_token_expiry_mins * 60;

    let claims = validate_token_at(&token, jwt, before).unwrap();
    assert_eq!(claims.sub, user["id"].as_i64().unwrap().to_string());

    assert_matches!(
        validate_token_at(&token, jwt, after + ttl),
        Err(CoreError::InvalidCredential)
    );
}

#[tokio::test]
async fn backdated_token_is_unauthorized() {
    let app = build_test_app();
    let (user, _) = sign_up_and_sign_in(&app.router, "ana@example.com").await;
    let user_id = user["id"].as_i64().unwrap();

    let jwt = &app.state.config.jwt;
    let issued_at = chrono::Utc::now().timestamp() - jwt.access_token_expiry_mins * 60 - 5;
    let stale = generate_access_token_at(user_id, issued_at, jwt).unwrap();

    let response = get_auth(&app.router, "/api/v1/users/me", &stale).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_another_secret_is_unauthorized() {
    let app = build_test_app();
    let (user, _) = sign_up_and_sign_in(&app.router, "ana@example.com").await;

    let mut foreign = app.state.config.jwt.clone();
    foreign.secret = "a-completely-different-secret".into();
    let token = generate_access_token(user["id"].as_i64().unwrap(), &foreign).unwrap();

    let response = get_auth(&app.router, "/api/v1/users/me", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_for_unknown_user_is_unauthorized() {
    let app = build_test_app();
    let token = generate_access_token(4242, &app.state.config.jwt).unwrap();

    let response = get_auth(&app.router, "/api/v1/users/me", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["error"],
        "Token invalid or expired"
    );
}

// ---------------------------------------------------------------------------
// Profile update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_changes_name_and_password() {
    let app = build_test_app();
    let (_, token) = sign_up_and_sign_in(&app.router, "ana@example.com").await;

    let body = serde_json::json!({
        "name": "Ana Maria",
        "password": "a-brand-new-password",
        "confirm_password": "a-brand-new-password",
    });
    let response = put_json_auth(&app.router, "/api/v1/users", body, &token).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(body_json(response).await["name"], "Ana Maria");

    let old = post_sign_in(&app.router, "ana@example.com", TEST_PASSWORD).await;
    assert_eq!(old.status(), StatusCode::BAD_REQUEST);

    let new = post_sign_in(&app.router, "ana@example.com", "a-brand-new-password").await;
    assert_eq!(new.status(), StatusCode::OK);
}
