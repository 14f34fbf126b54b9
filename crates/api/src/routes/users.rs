//! Route definitions for the `/users` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// User routes under the general rate limit.
///
/// ```text
/// POST  /users/signup  -> sign_up
/// GET   /users/me      -> me
/// GET   /users/file    -> avatar
/// PUT   /users         -> update
/// PATCH /users         -> upload_avatar
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/signup", post(users::sign_up))
        .route("/users/me", get(users::me))
        .route("/users/file", get(users::avatar))
        .route("/users", put(users::update).patch(users::upload_avatar))
}

/// `POST /users/signin`, kept apart so it can carry the sign-in ceiling.
pub fn sign_in_router() -> Router<AppState> {
    Router::new().route("/users/signin", post(users::sign_in))
}
