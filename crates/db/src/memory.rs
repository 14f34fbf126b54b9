//! In-process store implementing [`UserStore`] and [`CatalogStore`].
//!
//! Used by the API integration tests and for running the server without a
//! database. Ids are assigned from one shared sequence, like BIGSERIAL
//! columns. Uniqueness is not enforced here; the handlers check names and
//! e-mails before inserting, exactly as they do against Postgres.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use stock_core::types::DbId;

use crate::models::category::{Category, CreateCategory, UpdateCategory};
use crate::models::product::{CreateProduct, Product, ProductDetail, UpdateProduct};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::store::{CatalogStore, UserStore};

#[derive(Debug, Default)]
struct Tables {
    next_id: DbId,
    users: BTreeMap<DbId, User>,
    categories: BTreeMap<DbId, Category>,
    products: BTreeMap<DbId, Product>,
}

impl Tables {
    fn allocate_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn detail(&self, product: &Product) -> Result<ProductDetail, sqlx::Error> {
        let category = self
            .categories
            .get(&product.category_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        Ok(ProductDetail {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            banner: product.banner.clone(),
            category_id: category.id,
            category_name: category.name.clone(),
        })
    }
}

/// Store backed by in-memory B-tree maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (or succeed again with `false`).
    ///
    /// Reads are unaffected, which lets tests exercise failures that happen
    /// after a lookup succeeded.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), sqlx::Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(sqlx::Error::Protocol("simulated write failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_subject(&self, id: DbId) -> Result<Option<User>, sqlx::Error> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn find_by_credential_key(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create_user(&self, input: &CreateUser) -> Result<User, sqlx::Error> {
        self.check_writable()?;
        let mut tables = self.tables.write();
        let now = Utc::now();
        let user = User {
            id: tables.allocate_id(),
            name: input.name.clone(),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            avatar: String::new(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(
        &self,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        self.check_writable()?;
        let mut tables = self.tables.write();
        Ok(tables.users.get_mut(&id).map(|user| {
            user.name = input.name.clone();
            user.password_hash = input.password_hash.clone();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_avatar(&self, id: DbId, avatar: &str) -> Result<Option<User>, sqlx::Error> {
        self.check_writable()?;
        let mut tables = self.tables.write();
        Ok(tables.users.get_mut(&id).map(|user| {
            user.avatar = avatar.to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        Ok(())
    }

    async fn create_category(&self, input: &CreateCategory) -> Result<Category, sqlx::Error> {
        self.check_writable()?;
        let mut tables = self.tables.write();
        let now = Utc::now();
        let category = Category {
            id: tables.allocate_id(),
            name: input.name.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn find_category(&self, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        Ok(self.tables.read().categories.get(&id).cloned())
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, sqlx::Error> {
        Ok(self
            .tables
            .read()
            .categories
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn list_categories(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Category>, sqlx::Error> {
        Ok(self
            .tables
            .read()
            .categories
            .values()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn update_category(
        &self,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, sqlx::Error> {
        self.check_writable()?;
        let mut tables = self.tables.write();
        Ok(tables.categories.get_mut(&id).map(|category| {
            category.name = input.name.clone();
            category.updated_at = Utc::now();
            category.clone()
        }))
    }

    async fn delete_category(&self, id: DbId) -> Result<bool, sqlx::Error> {
        self.check_writable()?;
        let mut tables = self.tables.write();
        if tables.products.values().any(|p| p.category_id == id) {
            return Err(sqlx::Error::Protocol(
                "category is still referenced by products".into(),
            ));
        }
        Ok(tables.categories.remove(&id).is_some())
    }

    async fn create_product(&self, input: &CreateProduct) -> Result<ProductDetail, sqlx::Error> {
        self.check_writable()?;
        let mut tables = self.tables.write();
        if !tables.categories.contains_key(&input.category_id) {
            return Err(sqlx::Error::RowNotFound);
        }
        let now = Utc::now();
        let product = Product {
            id: tables.allocate_id(),
            name: input.name.clone(),
            description: input.description.clone(),
            banner: String::new(),
            category_id: input.category_id,
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(product.id, product.clone());
        tables.detail(&product)
    }

    async fn find_product(&self, id: DbId) -> Result<Option<ProductDetail>, sqlx::Error> {
        let tables = self.tables.read();
        tables.products.get(&id).map(|p| tables.detail(p)).transpose()
    }

    async fn find_product_by_name(&self, name: &str) -> Result<Option<Product>, sqlx::Error> {
        Ok(self
            .tables
            .read()
            .products
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn list_products(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductDetail>, sqlx::Error> {
        let tables = self.tables.read();
        tables
            .products
            .values()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|p| tables.detail(p))
            .collect()
    }

    async fn list_products_by_category(
        &self,
        category_id: DbId,
    ) -> Result<Vec<Product>, sqlx::Error> {
        Ok(self
            .tables
            .read()
            .products
            .values()
            .filter(|p| p.category_id == category_id)
            .cloned()
            .collect())
    }

    async fn update_product(
        &self,
        id: DbId,
        input: &UpdateProduct,
    ) -> Result<Option<ProductDetail>, sqlx::Error> {
        self.check_writable()?;
        let mut tables = self.tables.write();
        let Some(product) = tables.products.get_mut(&id) else {
            return Ok(None);
        };
        product.name = input.name.clone();
        product.description = input.description.clone();
        product.updated_at = Utc::now();
        let product = product.clone();
        tables.detail(&product).map(Some)
    }

    async fn set_banner(
        &self,
        id: DbId,
        banner: &str,
    ) -> Result<Option<ProductDetail>, sqlx::Error> {
        self.check_writable()?;
        let mut tables = self.tables.write();
        let Some(product) = tables.products.get_mut(&id) else {
            return Ok(None);
        };
        product.banner = banner.to_string();
        product.updated_at = Utc::now();
        let product = product.clone();
        tables.detail(&product).map(Some)
    }

    async fn delete_product(&self, id: DbId) -> Result<bool, sqlx::Error> {
        self.check_writable()?;
        Ok(self.tables.write().products.remove(&id).is_some())
    }
}
