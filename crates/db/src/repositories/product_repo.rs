//! Repository for the `products` table.
//!
//! Reads that feed API responses join `categories` so the category name
//! travels with the product ([`ProductDetail`]).

use sqlx::PgPool;
use stock_core::types::DbId;

use crate::models::product::{CreateProduct, Product, ProductDetail, UpdateProduct};

const COLUMNS: &str =
    "id, name, description, banner, category_id, created_at, updated_at";

/// Select list for [`ProductDetail`] over `p` (products) joined to `c` (categories).
const DETAIL_COLUMNS: &str =
    "p.id, p.name, p.description, p.banner, p.category_id, c.name AS category_name";

/// Provides CRUD operations for products.
pub struct ProductRepo;

impl ProductRepo {
    pub async fn create(pool: &PgPool, input: &CreateProduct) -> Result<ProductDetail, sqlx::Error> {
        let query = format!(
            "WITH p AS (
                INSERT INTO products (name, description, category_id)
                VALUES ($1, $2, $3)
                RETURNING *
             )
             SELECT {DETAIL_COLUMNS} FROM p JOIN categories c ON c.id = p.category_id"
        );
        sqlx::query_as::<_, ProductDetail>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.category_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ProductDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {DETAIL_COLUMNS} FROM products p
             JOIN categories c ON c.id = p.category_id
             WHERE p.id = $1"
        );
        sqlx::query_as::<_, ProductDetail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE name = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {DETAIL_COLUMNS} FROM products p
             JOIN categories c ON c.id = p.category_id
             ORDER BY p.id
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, ProductDetail>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// All products filed under a category, in id order.
    pub async fn list_by_category(
        pool: &PgPool,
        category_id: DbId,
    ) -> Result<Vec<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE category_id = $1 ORDER BY id");
        sqlx::query_as::<_, Product>(&query)
            .bind(category_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProduct,
    ) -> Result<Option<ProductDetail>, sqlx::Error> {
        let query = format!(
            "WITH p AS (
                UPDATE products SET name = $2, description = $3, updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {DETAIL_COLUMNS} FROM p JOIN categories c ON c.id = p.category_id"
        );
        sqlx::query_as::<_, ProductDetail>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Point the product's banner reference at a stored file name.
    pub async fn set_banner(
        pool: &PgPool,
        id: DbId,
        banner: &str,
    ) -> Result<Option<ProductDetail>, sqlx::Error> {
        let query = format!(
            "WITH p AS (
                UPDATE products SET banner = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {DETAIL_COLUMNS} FROM p JOIN categories c ON c.id = p.category_id"
        );
        sqlx::query_as::<_, ProductDetail>(&query)
            .bind(id)
            .bind(banner)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
