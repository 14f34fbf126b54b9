use std::sync::Arc;

use stock_core::rate_gate::RateGate;
use stock_db::{CatalogStore, UserStore};

use crate::assets::locks::OwnerLocks;
use crate::assets::store::AssetStore;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// User lookups and credential updates.
    pub users: Arc<dyn UserStore>,
    /// Categories and products.
    pub catalog: Arc<dyn CatalogStore>,
    /// Server configuration, read once at startup.
    pub config: Arc<ServerConfig>,
    /// Fixed-window admission counters shared by every request.
    pub rate_gate: Arc<RateGate>,
    /// Uploaded avatar and banner files.
    pub assets: Arc<AssetStore>,
    /// Serializes uploads per owner.
    pub upload_locks: Arc<OwnerLocks>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        catalog: Arc<dyn CatalogStore>,
        config: ServerConfig,
    ) -> Self {
        let assets = AssetStore::new(config.upload_dir.clone());
        Self {
            users,
            catalog,
            config: Arc::new(config),
            rate_gate: Arc::new(RateGate::default()),
            assets: Arc::new(assets),
            upload_locks: Arc::new(OwnerLocks::new()),
        }
    }
}
