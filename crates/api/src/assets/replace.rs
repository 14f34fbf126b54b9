//! Replacing an owner's asset.
//!
//! Under the owner's lock: read the current reference (the owner must exist),
//! validate the upload, store the new file, commit the new reference, then
//! delete the old file.
//! A store failure leaves the reference untouched. A commit failure removes
//! the new file again. A failure to remove the old file only logs.

use async_trait::async_trait;
use stock_core::assets::{generate_name, unsupported_extension, validate_extension, AssetCategory};
use stock_core::error::CoreError;
use stock_core::types::DbId;
use stock_db::models::product::ProductDetail;
use stock_db::models::user::User;
use stock_db::{CatalogStore, UserStore};

use crate::assets::locks::OwnerLocks;
use crate::assets::store::AssetStore;
use crate::assets::Upload;
use crate::error::AppResult;

/// An owner row holding one asset reference.
#[async_trait]
pub trait AssetSlot: Send + Sync {
    /// Row returned once the new reference is committed.
    type Owner: Send;

    fn category(&self) -> AssetCategory;

    fn owner_id(&self) -> DbId;

    /// Entity name used in not-found errors.
    fn entity(&self) -> &'static str;

    /// Current stored name (empty when none), or `None` if the owner is gone.
    async fn current(&self) -> Result<Option<String>, sqlx::Error>;

    /// Point the owner at `name`. `None` if the owner is gone.
    async fn commit(&self, name: &str) -> Result<Option<Self::Owner>, sqlx::Error>;
}

/// A user's avatar.
pub struct UserAvatar<'a> {
    pub users: &'a dyn UserStore,
    pub user_id: DbId,
}

#[async_trait]
impl<'a> AssetSlot for UserAvatar<'a> {
    type Owner = User;

    fn category(&self) -> AssetCategory {
        AssetCategory::Users
    }

    fn owner_id(&self) -> DbId {
        self.user_id
    }

    fn entity(&self) -> &'static str {
        "User"
    }

    async fn current(&self) -> Result<Option<String>, sqlx::Error> {
        Ok(self
            .users
            .find_by_subject(self.user_id)
            .await?
            .map(|user| user.avatar))
    }

    async fn commit(&self, name: &str) -> Result<Option<User>, sqlx::Error> {
        self.users.set_avatar(self.user_id, name).await
    }
}

/// A product's banner.
pub struct ProductBanner<'a> {
    pub catalog: &'a dyn CatalogStore,
    pub product_id: DbId,
}

#[async_trait]
impl<'a> AssetSlot for ProductBanner<'a> {
    type Owner = ProductDetail;

    fn category(&self) -> AssetCategory {
        AssetCategory::Products
    }

    fn owner_id(&self) -> DbId {
        self.product_id
    }

    fn entity(&self) -> &'static str {
        "Product"
    }

    async fn current(&self) -> Result<Option<String>, sqlx::Error> {
        Ok(self
            .catalog
            .find_product(self.product_id)
            .await?
            .map(|product| product.banner))
    }

    async fn commit(&self, name: &str) -> Result<Option<ProductDetail>, sqlx::Error> {
        self.catalog.set_banner(self.product_id, name).await
    }
}

/// Store `upload` as the slot's new asset and retire the previous one.
pub async fn replace_asset<S: AssetSlot>(
    assets: &AssetStore,
    locks: &OwnerLocks,
    slot: &S,
    upload: &Upload,
) -> AppResult<S::Owner> {
    let category = slot.category();
    let owner_id = slot.owner_id();
    let not_found = || CoreError::NotFound {
        entity: slot.entity(),
        id: owner_id,
    };

    let _guard = locks.acquire(category, owner_id).await;

    let previous = slot.current().await?.ok_or_else(not_found)?;

    if !validate_extension(&upload.filename) {
        return Err(unsupported_extension().into());
    }

    let name = generate_name(&upload.filename, &upload.bytes)?;
    assets.put(&name, category, &upload.bytes).await?;

    let committed = match slot.commit(&name).await {
        Ok(Some(owner)) => owner,
        Ok(None) => {
            discard_new(assets, &name, category).await;
            return Err(not_found().into());
        }
        Err(e) => {
            discard_new(assets, &name, category).await;
            return Err(e.into());
        }
    };

    if !previous.is_empty() && previous != name {
        if let Err(e) = assets.delete(&previous, category).await {
            tracing::warn!(%category, owner_id, name = %previous, error = %e, "Failed to delete replaced asset");
        }
    }

    tracing::info!(%category, owner_id, name = %name, "Asset replaced");
    Ok(committed)
}

async fn discard_new(assets: &AssetStore, name: &str, category: AssetCategory) {
    if let Err(e) = assets.delete(name, category).await {
        tracing::warn!(%category, name, error = %e, "Failed to remove uncommitted asset");
    }
}
