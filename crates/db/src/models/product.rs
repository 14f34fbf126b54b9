//! Product entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use stock_core::types::{DbId, Timestamp};

use crate::models::category::CategoryResponse;

/// A row from the `products` table.
#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: DbId,
    pub name: String,
    pub description: String,
    /// Stored banner file name, empty when the product has none.
    pub banner: String,
    pub category_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A product joined with the name of its category.
#[derive(Debug, Clone, FromRow)]
pub struct ProductDetail {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub banner: String,
    pub category_id: DbId,
    pub category_name: String,
}

/// Product fields without the category, as listed inside a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub banner: String,
}

impl From<Product> for ProductSummary {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            banner: product.banner,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductResponse {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub banner: String,
    pub category: CategoryResponse,
}

impl From<ProductDetail> for ProductResponse {
    fn from(detail: ProductDetail) -> Self {
        Self {
            id: detail.id,
            name: detail.name,
            description: detail.description,
            banner: detail.banner,
            category: CategoryResponse {
                id: detail.category_id,
                name: detail.category_name,
            },
        }
    }
}

/// DTO for creating a product.
#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub description: String,
    pub category_id: DbId,
}

/// DTO for updating a product's descriptive fields.
#[derive(Debug, Deserialize)]
pub struct UpdateProduct {
    pub name: String,
    pub description: String,
}
