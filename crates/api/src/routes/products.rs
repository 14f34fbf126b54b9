//! Route definitions for the `/products` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::products;
use crate::state::AppState;

/// Routes mounted at `/products`.
///
/// ```text
/// GET    /           -> list
/// POST   /           -> create
/// GET    /{id}       -> get_by_id
/// PUT    /{id}       -> update
/// PATCH  /{id}       -> upload_banner
/// DELETE /{id}       -> delete
/// GET    /file/{id}  -> banner
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route(
            "/{id}",
            get(products::get_by_id)
                .put(products::update)
                .patch(products::upload_banner)
                .delete(products::delete),
        )
        .route("/file/{id}", get(products::banner))
}
