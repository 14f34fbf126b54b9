#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::Algorithm;
use tempfile::TempDir;
use tower::ServiceExt;

use stock_api::auth::jwt::JwtConfig;
use stock_api::config::{RateLimitConfig, ServerConfig};
use stock_api::router::build_app_router;
use stock_api::state::AppState;
use stock_db::MemoryStore;

/// Ceiling on `POST /users/signin` used by every test app.
pub const SIGN_IN_LIMIT: u32 = 3;

/// Ceiling on every other route used by every test app.
pub const GENERAL_LIMIT: u32 = 1000;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Multipart boundary used by [`multipart_auth`].
const BOUNDARY: &str = "stock-test-boundary";

/// Build a test `ServerConfig` that stores uploads under `upload_dir`.
pub fn test_config(upload_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "postgres://unused".to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            algorithm: Algorithm::HS256,
            access_token_expiry_mins: 60,
        },
        rate_limit: RateLimitConfig {
            general_per_minute: GENERAL_LIMIT,
            sign_in_per_minute: SIGN_IN_LIMIT,
        },
        upload_dir: upload_dir.to_path_buf(),
        page_size: 25,
        max_upload_bytes: 1024 * 1024,
    }
}

/// A running test application backed by an in-memory store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    /// Keeps the upload directory alive for the duration of the test.
    pub upload_dir: TempDir,
}

/// Build the full application router, with the production middleware stack,
/// over a fresh [`MemoryStore`] and a temporary upload directory.
pub fn build_test_app() -> TestApp {
    let upload_dir = tempfile::tempdir().expect("temp dir should be created");
    let config = test_config(upload_dir.path());
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), store.clone(), config.clone());
    let router = build_app_router(state.clone(), &config).expect("router should build");

    TestApp {
        router,
        store,
        state,
        upload_dir,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn delete_auth(app: &Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    json_auth(app, Method::POST, uri, body, token).await
}

pub async fn put_json_auth(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    json_auth(app, Method::PUT, uri, body, token).await
}

async fn json_auth(
    app: &Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// URL-encoded sign-in form, sent from `peer` when given.
pub fn sign_in_request(email: &str, password: &str, peer: Option<SocketAddr>) -> Request<Body> {
    let form = format!(
        "username={}&password={}",
        form_encode(email),
        form_encode(password)
    );
    let mut request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/users/signin")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    if let Some(addr) = peer {
        request.extensions_mut().insert(ConnectInfo(addr));
    }
    request
}

pub async fn post_sign_in(app: &Router, email: &str, password: &str) -> Response {
    send(app, sign_in_request(email, password, None)).await
}

/// PATCH `uri` with a single multipart file field.
pub async fn multipart_auth(
    app: &Router,
    uri: &str,
    field: &str,
    filename: &str,
    bytes: &[u8],
    token: &str,
) -> Response {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::PATCH)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Register `email` through the API and return the created user JSON.
pub async fn sign_up(app: &Router, name: &str, email: &str) -> serde_json::Value {
    let body = serde_json::json!({
        "name": name,
        "email": email,
        "password": TEST_PASSWORD,
        "confirm_password": TEST_PASSWORD,
    });
    let response = post_json(app, "/api/v1/users/signup", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

/// Register and sign in, returning `(user json, access token)`.
pub async fn sign_up_and_sign_in(app: &Router, email: &str) -> (serde_json::Value, String) {
    let user = sign_up(app, "Test User", email).await;
    let response = post_sign_in(app, email, TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let token = json["access_token"].as_str().unwrap().to_string();
    (user, token)
}

/// Create a category through the API and return its id.
pub async fn create_category(app: &Router, token: &str, name: &str) -> i64 {
    let response = post_json_auth(
        app,
        "/api/v1/categories",
        serde_json::json!({ "name": name }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_i64().unwrap()
}

/// Create a product through the API and return its id.
pub async fn create_product(app: &Router, token: &str, name: &str, category_id: i64) -> i64 {
    let response = post_json_auth(
        app,
        "/api/v1/products",
        serde_json::json!({ "name": name, "description": "", "category_id": category_id }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_i64().unwrap()
}

/// File names currently stored in one asset category directory.
pub fn stored_files(root: &Path, dir_name: &str) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(root.join(dir_name))
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

fn form_encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}
