//! Per-owner upload locks.
//!
//! Uploads for the same owner (one user's avatar, one product's banner) run
//! one at a time; uploads for different owners never wait on each other.
//! The registry keeps one async mutex per owner that currently has an upload
//! in flight and drops entries nobody holds or waits on.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use stock_core::assets::AssetCategory;
use stock_core::types::DbId;
use tokio::sync::OwnedMutexGuard;

type OwnerKey = (AssetCategory, DbId);

/// Held for the duration of one upload; released on drop.
#[derive(Debug)]
pub struct OwnerGuard {
    _guard: OwnedMutexGuard<()>,
}

#[derive(Debug, Default)]
pub struct OwnerLocks {
    locks: Mutex<HashMap<OwnerKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl OwnerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `owner`'s asset slot in `category`.
    pub async fn acquire(&self, category: AssetCategory, owner: DbId) -> OwnerGuard {
        let lock = {
            let mut locks = self.locks.lock();
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry((category, owner)).or_default())
        };

        OwnerGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of owners with an entry in the registry.
    pub fn tracked(&self) -> usize {
        self.locks.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_owner_is_serialized() {
        let locks = Arc::new(OwnerLocks::new());
        let active = Arc::new(AtomicU32::new(0));
        let peak = Arc::new(AtomicU32::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                tokio::spawn(async move {
                    let _guard = locks.acquire(AssetCategory::Users, 1).await;
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_owners_do_not_block() {
        let locks = OwnerLocks::new();
        let _user = locks.acquire(AssetCategory::Users, 1).await;

        let other = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(AssetCategory::Users, 2),
        )
        .await;
        assert!(other.is_ok());

        let product = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(AssetCategory::Products, 1),
        )
        .await;
        assert!(product.is_ok());
    }

    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let locks = OwnerLocks::new();
        for owner in 0..10 {
            drop(locks.acquire(AssetCategory::Products, owner).await);
        }
        let _held = locks.acquire(AssetCategory::Products, 99).await;

        assert_eq!(locks.tracked(), 1);
    }
}
