pub mod categories;
pub mod health;
pub mod products;
pub mod users;

use axum::middleware::from_fn_with_state;
use axum::Router;

use crate::middleware::rate_limit::{general_limit, sign_in_limit};
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /users/signup                 sign up (public)
/// /users/signin                 sign in (public, strict rate limit)
/// /users/me                     current user
/// /users/file                   current user's avatar
/// /users                        update profile (PUT), upload avatar (PATCH)
///
/// /categories                   list, create
/// /categories/{id}              get, update, delete
///
/// /products                     list, create
/// /products/{id}                get, update, upload banner (PATCH), delete
/// /products/file/{id}           banner
/// ```
///
/// Every route is rate limited. Sign-in only counts against its own, stricter
/// ceiling; everything else shares the general ceiling.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(users::router())
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .route_layer(from_fn_with_state(state.clone(), general_limit))
        .merge(
            users::sign_in_router()
                .route_layer(from_fn_with_state(state.clone(), sign_in_limit)),
        )
}
