//! Handlers for the `/categories` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use stock_core::error::CoreError;
use stock_core::types::DbId;
use stock_db::models::category::{
    Category, CategoryDetailResponse, CategoryResponse, CreateCategory, UpdateCategory,
};
use stock_db::models::product::ProductSummary;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::validate_input;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::state::AppState;

/// Request body for creating or renaming a category.
#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// POST /api/v1/categories
pub async fn create(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(input): Json<CategoryRequest>,
) -> AppResult<(StatusCode, Json<CategoryResponse>)> {
    validate_input(&input)?;
    ensure_name_free(&state, &input.name, None).await?;

    let category = state
        .catalog
        .create_category(&CreateCategory { name: input.name })
        .await?;

    tracing::info!(category_id = category.id, "Category created");
    Ok((StatusCode::CREATED, Json(category.into())))
}

/// GET /api/v1/categories
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Vec<CategoryResponse>>> {
    let (limit, offset) = params.resolve(state.config.page_size);
    let categories = state.catalog.list_categories(limit, offset).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/categories/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<CategoryDetailResponse>> {
    let category = find_category(&state, id).await?;
    Ok(Json(with_products(&state, category).await?))
}

/// PUT /api/v1/categories/{id}
pub async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<CategoryRequest>,
) -> AppResult<(StatusCode, Json<CategoryDetailResponse>)> {
    validate_input(&input)?;
    find_category(&state, id).await?;
    ensure_name_free(&state, &input.name, Some(id)).await?;

    let category = state
        .catalog
        .update_category(id, &UpdateCategory { name: input.name })
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Category",
            id,
        })?;

    tracing::info!(category_id = id, "Category updated");
    Ok((StatusCode::ACCEPTED, Json(with_products(&state, category).await?)))
}

/// DELETE /api/v1/categories/{id}
///
/// Refused with 422 while any product still belongs to the category.
pub async fn delete(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_category(&state, id).await?;

    if !state.catalog.list_products_by_category(id).await?.is_empty() {
        return Err(AppError::Core(CoreError::Unprocessable(
            "Category still has products registered".into(),
        )));
    }

    if !state.catalog.delete_category(id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id,
        }));
    }

    tracing::info!(category_id = id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_category(state: &AppState, id: DbId) -> AppResult<Category> {
    state
        .catalog
        .find_category(id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id,
        }))
}

/// Fail with 409 if another category already uses `name`.
async fn ensure_name_free(state: &AppState, name: &str, own_id: Option<DbId>) -> AppResult<()> {
    match state.catalog.find_category_by_name(name).await? {
        Some(existing) if Some(existing.id) != own_id => Err(AppError::Core(CoreError::Conflict(
            "Category name already exists".into(),
        ))),
        _ => Ok(()),
    }
}

async fn with_products(state: &AppState, category: Category) -> AppResult<CategoryDetailResponse> {
    let products = state
        .catalog
        .list_products_by_category(category.id)
        .await?
        .into_iter()
        .map(ProductSummary::from)
        .collect();
    Ok(CategoryDetailResponse::new(category, products))
}
