//! Rate-limit route layers.
//!
//! Mounted with `route_layer` so they run after routing (the matched route
//! template is known) and before any handler extractor, including
//! [`AuthUser`](crate::middleware::auth::AuthUser). A rejected call never
//! reaches identity resolution.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use stock_core::error::CoreError;
use stock_core::rate_gate::{retry_after_secs, Admission};

use crate::error::AppError;
use crate::state::AppState;

/// Client key used when the peer address is unknown.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Apply the general per-minute ceiling.
pub async fn general_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    admit(&state, &request, state.config.rate_limit.general_per_minute)?;
    Ok(next.run(request).await)
}

/// Apply the stricter sign-in ceiling.
pub async fn sign_in_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    admit(&state, &request, state.config.rate_limit.sign_in_per_minute)?;
    Ok(next.run(request).await)
}

fn admit(state: &AppState, request: &Request, limit: u32) -> Result<(), AppError> {
    let client = client_key(request);
    let route = route_key(request);

    match state.rate_gate.admit(&client, &route, limit) {
        Admission::Allowed { .. } => Ok(()),
        Admission::Rejected { retry_after } => {
            let retry_after_secs = retry_after_secs(retry_after);
            tracing::warn!(client = %client, route = %route, limit, retry_after_secs, "Rate limit exceeded");
            Err(CoreError::RateExceeded { retry_after_secs }.into())
        }
    }
}

/// Peer IP from `ConnectInfo`, or [`UNKNOWN_CLIENT`].
pub fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// `"<METHOD> <route template>"`, falling back to the raw path.
pub fn route_key(request: &Request) -> String {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or_else(|| request.uri().path());
    format!("{} {path}", request.method())
}
