//! Concurrent product storage with per-product check exclusivity.
//!
//! [`ProductRegistry`] stores every tracked product in a `HashMap` whose
//! values are individually locked [`ProductSlot`]s. A slot carries two
//! locks:
//!
//! - `product`: a [`RwLock`] over the entity, held only for reads and for
//!   the (synchronous) update-and-evaluate transition;
//! - `check`: a [`Mutex`] held for the whole duration of a price check,
//!   extraction call included, so at most one check per product is in
//!   flight at any time.
//!
//! Removing a product retires its slot under the `product` write lock, so
//! a check that still holds the slot sees the removal before applying a
//! price.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::ProductId;
use super::product::TrackedProduct;
use crate::error::SentinelError;

/// A registered product plus its check lock.
#[derive(Debug)]
pub struct ProductSlot {
    product: RwLock<TrackedProduct>,
    check: Mutex<()>,
    retired: AtomicBool,
}

impl ProductSlot {
    /// Wraps a product in a fresh slot.
    #[must_use]
    pub fn new(product: TrackedProduct) -> Self {
        Self {
            product: RwLock::new(product),
            check: Mutex::new(()),
            retired: AtomicBool::new(false),
        }
    }

    /// Shared access to the entity.
    pub async fn read(&self) -> RwLockReadGuard<'_, TrackedProduct> {
        self.product.read().await
    }

    /// Exclusive access to the entity. Keep the guard short-lived.
    pub async fn write(&self) -> RwLockWriteGuard<'_, TrackedProduct> {
        self.product.write().await
    }

    /// Clones the current entity state.
    pub async fn snapshot(&self) -> TrackedProduct {
        self.product.read().await.clone()
    }

    /// Claims the check lock if no check is in flight.
    #[must_use]
    pub fn try_begin_check(&self) -> Option<MutexGuard<'_, ()>> {
        self.check.try_lock().ok()
    }

    /// Waits for any in-flight check, then claims the check lock.
    pub async fn begin_check(&self) -> MutexGuard<'_, ()> {
        self.check.lock().await
    }

    /// `true` once the product has been removed from its registry.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    /// Marks the slot removed, waiting out any writer.
    async fn retire(&self) {
        let _product = self.product.write().await;
        self.retired.store(true, Ordering::SeqCst);
    }
}

/// Central store for all tracked products.
///
/// # Concurrency
///
/// - The outer map lock is held only long enough to clone slot handles.
/// - Checks on different products never contend.
/// - Checks on the same product are serialized by the slot's check lock.
#[derive(Debug)]
pub struct ProductRegistry {
    products: RwLock<HashMap<ProductId, Arc<ProductSlot>>>,
}

impl ProductRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            products: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a new product.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::InvalidRequest`] if a product with the
    /// same ID is already registered.
    pub async fn insert(&self, product: TrackedProduct) -> Result<ProductId, SentinelError> {
        let id = product.id;
        let mut map = self.products.write().await;
        if map.contains_key(&id) {
            return Err(SentinelError::InvalidRequest(format!(
                "product {id} already exists"
            )));
        }
        map.insert(id, Arc::new(ProductSlot::new(product)));
        Ok(id)
    }

    /// Returns the slot for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::ProductNotFound`] if no such product exists.
    pub async fn get(&self, id: ProductId) -> Result<Arc<ProductSlot>, SentinelError> {
        let map = self.products.read().await;
        map.get(&id)
            .cloned()
            .ok_or(SentinelError::ProductNotFound(*id.as_uuid()))
    }

    /// Returns `true` if `id` is currently registered.
    pub async fn contains(&self, id: ProductId) -> bool {
        self.products.read().await.contains_key(&id)
    }

    /// Removes a product and retires its slot. Returns `None` when it was
    /// not registered.
    pub async fn remove(&self, id: ProductId) -> Option<Arc<ProductSlot>> {
        let slot = self.products.write().await.remove(&id)?;
        // The map lock is released before the slot lock is taken.
        slot.retire().await;
        Some(slot)
    }

    /// Clones every product, newest first (by first observation, then id).
    pub async fn snapshot(&self) -> Vec<TrackedProduct> {
        let slots = self.slots().await;
        let mut products = Vec::with_capacity(slots.len());
        for slot in slots {
            products.push(slot.snapshot().await);
        }
        products.sort_by(|a, b| {
            b.first_seen()
                .cmp(&a.first_seen())
                .then_with(|| a.id.cmp(&b.id))
        });
        products
    }

    /// Products whose name contains `query` (case-insensitive), newest first.
    pub async fn search(&self, query: &str) -> Vec<TrackedProduct> {
        let mut products = self.snapshot().await;
        products.retain(|p| p.matches_query(query));
        products
    }

    /// Active products with `now >= next_check`, most overdue first.
    pub async fn due(&self, now: DateTime<Utc>) -> Vec<(ProductId, Arc<ProductSlot>)> {
        let map = self.products.read().await;
        let mut due = Vec::new();
        for (id, slot) in map.iter() {
            let product = slot.read().await;
            if product.is_due(now) {
                due.push((product.next_check, *id, Arc::clone(slot)));
            }
        }
        drop(map);
        due.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        due.into_iter().map(|(_, id, slot)| (id, slot)).collect()
    }

    /// Returns the number of registered products.
    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    /// Returns `true` if nothing is registered.
    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }

    async fn slots(&self) -> Vec<Arc<ProductSlot>> {
        self.products.read().await.values().cloned().collect()
    }
}

impl Default for ProductRegistry {
    fn default() -> Self {
        Self::new()
    }
}
