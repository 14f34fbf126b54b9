//! Request handlers.
//!
//! Each submodule provides the async handler functions for one resource.
//! Handlers talk to the stores in [`AppState`](crate::state::AppState) and map
//! errors via [`AppError`].

pub mod categories;
pub mod products;
pub mod users;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use stock_core::error::CoreError;
use tokio_util::io::ReaderStream;
use validator::Validate;

use crate::assets::store::OpenAsset;
use crate::error::{AppError, AppResult};

/// Run `validator` rules on a request body, reporting failures as 400.
pub(crate) fn validate_input(input: &impl Validate) -> AppResult<()> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))
}

/// Stream a stored asset, or answer `204 No Content` when there is none.
pub(crate) fn asset_response(asset: Option<OpenAsset>) -> AppResult<Response> {
    let Some(asset) = asset else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, asset.content_type)
        .header(header::CONTENT_LENGTH, asset.len.to_string())
        .body(Body::from_stream(ReaderStream::new(asset.file)))
        .map_err(|e| AppError::InternalError(format!("Failed to build asset response: {e}")))
}
