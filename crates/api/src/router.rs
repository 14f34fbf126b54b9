//! The complete HTTP application.
//!
//! [`build_app_router`] is the one place the route tree meets the
//! cross-cutting layers, so the binary and the integration tests serve the
//! same thing.

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::Router;
use stock_core::error::CoreError;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

/// Header carrying the per-request correlation id.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// How long browsers may cache a preflight answer.
const CORS_PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(3600);

/// Build the application: `/health` at the root, the API under `/api/v1`.
///
/// A request passes, outermost first: CORS, request-id assignment, the trace
/// span (which therefore records the id), id propagation onto the response,
/// the request timeout, panic recovery and finally the body limit, which caps
/// avatar and banner uploads at `MAX_UPLOAD_BYTES`. Admission ceilings are
/// not here; they sit on the routes themselves (see [`routes::api_routes`])
/// so `/health` is never counted.
///
/// Fails only when the configured CORS origins are unusable.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Result<Router, CoreError> {
    let cors = build_cors_layer(config)?;
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let request_timeout = Duration::from_secs(config.request_timeout_secs);

    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes(&state))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(cors)
        .with_state(state);

    Ok(app)
}

/// CORS policy for browser clients of the API.
///
/// Only the configured origins are allowed. Clients authenticate with a
/// bearer header, never cookies, so credentials are not allowed.
pub fn build_cors_layer(config: &ServerConfig) -> Result<CorsLayer, CoreError> {
    let origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| {
                CoreError::Configuration(format!("Invalid CORS origin '{origin}': {e}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(CORS_PREFLIGHT_MAX_AGE))
}
