//! Category entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use stock_core::types::{DbId, Timestamp};

use crate::models::product::ProductSummary;

/// A row from the `categories` table.
#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryResponse {
    pub id: DbId,
    pub name: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
        }
    }
}

/// A category together with the products filed under it.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetailResponse {
    pub id: DbId,
    pub name: String,
    pub products: Vec<ProductSummary>,
}

impl CategoryDetailResponse {
    pub fn new(category: Category, products: Vec<ProductSummary>) -> Self {
        Self {
            id: category.id,
            name: category.name,
            products,
        }
    }
}

/// DTO for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategory {
    pub name: String,
}

/// DTO for renaming a category.
#[derive(Debug, Deserialize)]
pub struct UpdateCategory {
    pub name: String,
}
