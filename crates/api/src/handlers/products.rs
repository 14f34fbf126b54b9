//! Handlers for the `/products` resource.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use stock_core::assets::AssetCategory;
use stock_core::error::CoreError;
use stock_core::types::DbId;
use stock_db::models::product::{CreateProduct, ProductDetail, ProductResponse, UpdateProduct};
use validator::Validate;

use crate::assets::multipart::read_file_field;
use crate::assets::replace::{replace_asset, ProductBanner};
use crate::error::{AppError, AppResult};
use crate::handlers::{asset_response, validate_input};
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::state::AppState;

/// Multipart field carrying the banner image.
pub const BANNER_FIELD: &str = "banner";

/// Request body for `POST /products`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category_id: DbId,
}

/// Request body for `PUT /products/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// POST /api/v1/products
pub async fn create(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(input): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ProductResponse>)> {
    validate_input(&input)?;

    if state.catalog.find_category(input.category_id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id: input.category_id,
        }));
    }
    ensure_name_free(&state, &input.name, None).await?;

    let product = state
        .catalog
        .create_product(&CreateProduct {
            name: input.name,
            description: input.description,
            category_id: input.category_id,
        })
        .await?;

    tracing::info!(product_id = product.id, category_id = product.category_id, "Product created");
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// GET /api/v1/products
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Vec<ProductResponse>>> {
    let (limit, offset) = params.resolve(state.config.page_size);
    let products = state.catalog.list_products(limit, offset).await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/products/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<ProductResponse>> {
    Ok(Json(find_product(&state, id).await?.into()))
}

/// GET /api/v1/products/file/{id}
///
/// Stream the product's banner, or 204 when it has none.
pub async fn banner(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    let product = find_product(&state, id).await?;
    let asset = state
        .assets
        .open(&product.banner, AssetCategory::Products)
        .await?;
    asset_response(asset)
}

/// PUT /api/v1/products/{id}
pub async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProductRequest>,
) -> AppResult<(StatusCode, Json<ProductResponse>)> {
    validate_input(&input)?;
    find_product(&state, id).await?;
    ensure_name_free(&state, &input.name, Some(id)).await?;

    let product = state
        .catalog
        .update_product(
            id,
            &UpdateProduct {
                name: input.name,
                description: input.description,
            },
        )
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Product",
            id,
        })?;

    tracing::info!(product_id = id, "Product updated");
    Ok((StatusCode::ACCEPTED, Json(product.into())))
}

/// PATCH /api/v1/products/{id}
///
/// Upload a new banner (multipart field `banner`), replacing any previous one.
pub async fn upload_banner(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ProductResponse>)> {
    let upload = read_file_field(&mut multipart, BANNER_FIELD).await?;
    let slot = ProductBanner {
        catalog: state.catalog.as_ref(),
        product_id: id,
    };

    let product = replace_asset(&state.assets, &state.upload_locks, &slot, &upload).await?;
    Ok((StatusCode::ACCEPTED, Json(product.into())))
}

/// DELETE /api/v1/products/{id}
///
/// Removes the row, then its banner file.
pub async fn delete(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let _guard = state.upload_locks.acquire(AssetCategory::Products, id).await;

    let product = find_product(&state, id).await?;
    if !state.catalog.delete_product(id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }));
    }

    if let Err(e) = state
        .assets
        .delete(&product.banner, AssetCategory::Products)
        .await
    {
        tracing::warn!(product_id = id, error = %e, "Failed to delete banner of removed product");
    }

    tracing::info!(product_id = id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_product(state: &AppState, id: DbId) -> AppResult<ProductDetail> {
    state
        .catalog
        .find_product(id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }))
}

/// Fail with 409 if another product already uses `name`.
async fn ensure_name_free(state: &AppState, name: &str, own_id: Option<DbId>) -> AppResult<()> {
    match state.catalog.find_product_by_name(name).await? {
        Some(existing) if Some(existing.id) != own_id => Err(AppError::Core(CoreError::Conflict(
            "Product name already exists".into(),
        ))),
        _ => Ok(()),
    }
}
