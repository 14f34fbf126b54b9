//! Persistence seams consumed by the API layer.
//!
//! Handlers and the identity resolver only see [`UserStore`] and
//! [`CatalogStore`]. [`PgStore`] implements both on top of the Postgres
//! repositories; [`MemoryStore`](crate::memory::MemoryStore) implements them
//! in process.

use async_trait::async_trait;
use stock_core::types::DbId;

use crate::models::category::{Category, CreateCategory, UpdateCategory};
use crate::models::product::{CreateProduct, Product, ProductDetail, UpdateProduct};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::repositories::{CategoryRepo, ProductRepo, UserRepo};
use crate::DbPool;

/// User lookups and credential updates.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Resolve the user a token subject refers to.
    async fn find_by_subject(&self, id: DbId) -> Result<Option<User>, sqlx::Error>;

    /// Resolve the credential record for a sign-in identity (e-mail).
    async fn find_by_credential_key(&self, email: &str) -> Result<Option<User>, sqlx::Error>;

    async fn create_user(&self, input: &CreateUser) -> Result<User, sqlx::Error>;

    async fn update_user(&self, id: DbId, input: &UpdateUser)
        -> Result<Option<User>, sqlx::Error>;

    async fn set_avatar(&self, id: DbId, avatar: &str) -> Result<Option<User>, sqlx::Error>;
}

/// Categories and products.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Verify the backing store is reachable.
    async fn ping(&self) -> Result<(), sqlx::Error>;

    async fn create_category(&self, input: &CreateCategory) -> Result<Category, sqlx::Error>;
    async fn find_category(&self, id: DbId) -> Result<Option<Category>, sqlx::Error>;
    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, sqlx::Error>;
    async fn list_categories(&self, limit: i64, offset: i64)
        -> Result<Vec<Category>, sqlx::Error>;
    async fn update_category(
        &self,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, sqlx::Error>;
    async fn delete_category(&self, id: DbId) -> Result<bool, sqlx::Error>;

    async fn create_product(&self, input: &CreateProduct) -> Result<ProductDetail, sqlx::Error>;
    async fn find_product(&self, id: DbId) -> Result<Option<ProductDetail>, sqlx::Error>;
    async fn find_product_by_name(&self, name: &str) -> Result<Option<Product>, sqlx::Error>;
    async fn list_products(&self, limit: i64, offset: i64)
        -> Result<Vec<ProductDetail>, sqlx::Error>;
    async fn list_products_by_category(
        &self,
        category_id: DbId,
    ) -> Result<Vec<Product>, sqlx::Error>;
    async fn update_product(
        &self,
        id: DbId,
        input: &UpdateProduct,
    ) -> Result<Option<ProductDetail>, sqlx::Error>;
    async fn set_banner(&self, id: DbId, banner: &str)
        -> Result<Option<ProductDetail>, sqlx::Error>;
    async fn delete_product(&self, id: DbId) -> Result<bool, sqlx::Error>;
}

/// Postgres-backed store delegating to the repositories.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_subject(&self, id: DbId) -> Result<Option<User>, sqlx::Error> {
        UserRepo::find_by_id(&self.pool, id).await
    }

    async fn find_by_credential_key(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        UserRepo::find_by_email(&self.pool, email).await
    }

    async fn create_user(&self, input: &CreateUser) -> Result<User, sqlx::Error> {
        UserRepo::create(&self.pool, input).await
    }

    async fn update_user(
        &self,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        UserRepo::update(&self.pool, id, input).await
    }

    async fn set_avatar(&self, id: DbId, avatar: &str) -> Result<Option<User>, sqlx::Error> {
        UserRepo::set_avatar(&self.pool, id, avatar).await
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        crate::health_check(&self.pool).await
    }

    async fn create_category(&self, input: &CreateCategory) -> Result<Category, sqlx::Error> {
        CategoryRepo::create(&self.pool, input).await
    }

    async fn find_category(&self, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        CategoryRepo::find_by_id(&self.pool, id).await
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, sqlx::Error> {
        CategoryRepo::find_by_name(&self.pool, name).await
    }

    async fn list_categories(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Category>, sqlx::Error> {
        CategoryRepo::list(&self.pool, limit, offset).await
    }

    async fn update_category(
        &self,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, sqlx::Error> {
        CategoryRepo::update(&self.pool, id, input).await
    }

    async fn delete_category(&self, id: DbId) -> Result<bool, sqlx::Error> {
        CategoryRepo::delete(&self.pool, id).await
    }

    async fn create_product(&self, input: &CreateProduct) -> Result<ProductDetail, sqlx::Error> {
        ProductRepo::create(&self.pool, input).await
    }

    async fn find_product(&self, id: DbId) -> Result<Option<ProductDetail>, sqlx::Error> {
        ProductRepo::find_by_id(&self.pool, id).await
    }

    async fn find_product_by_name(&self, name: &str) -> Result<Option<Product>, sqlx::Error> {
        ProductRepo::find_by_name(&self.pool, name).await
    }

    async fn list_products(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductDetail>, sqlx::Error> {
        ProductRepo::list(&self.pool, limit, offset).await
    }

    async fn list_products_by_category(
        &self,
        category_id: DbId,
    ) -> Result<Vec<Product>, sqlx::Error> {
        ProductRepo::list_by_category(&self.pool, category_id).await
    }

    async fn update_product(
        &self,
        id: DbId,
        input: &UpdateProduct,
    ) -> Result<Option<ProductDetail>, sqlx::Error> {
        ProductRepo::update(&self.pool, id, input).await
    }

    async fn set_banner(
        &self,
        id: DbId,
        banner: &str,
    ) -> Result<Option<ProductDetail>, sqlx::Error> {
        ProductRepo::set_banner(&self.pool, id, banner).await
    }

    async fn delete_product(&self, id: DbId) -> Result<bool, sqlx::Error> {
        ProductRepo::delete(&self.pool, id).await
    }
}
