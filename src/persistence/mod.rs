//! Persistence layer: whole-collection product snapshots.
//!
//! The product collection is stored as one JSON array under a fixed key
//! ([`STORAGE_KEY`]). It is loaded once at startup and rewritten in full
//! after every mutation. Backends implement [`SnapshotStore`]:
//!
//! - [`JsonFileStore`]: a JSON file, replaced atomically on save;
//! - [`PostgresSnapshotStore`]: a `JSONB` row keyed by [`STORAGE_KEY`];
//! - [`MemorySnapshotStore`]: process memory, for tests and ephemeral runs.

pub mod file;
pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt::Debug;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::TrackedProduct;

pub use file::JsonFileStore;
pub use memory::MemorySnapshotStore;
pub use postgres::PostgresSnapshotStore;

/// Key the product collection is stored under.
pub const STORAGE_KEY: &str = "sentinel_products";

/// Snapshot store failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(String),

    /// The stored snapshot is not a valid product array.
    #[error("snapshot is corrupt: {0}")]
    Corrupt(String),

    /// Database failure.
    #[error("database error: {0}")]
    Database(String),

    /// The collection could not be encoded.
    #[error("serialization error: {0}")]
    Serialize(String),
}

/// Load-all / save-all storage for the product collection.
#[async_trait]
pub trait SnapshotStore: Send + Sync + Debug {
    /// Loads the stored collection. `Ok(None)` means nothing was stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupt`] for an unparsable snapshot and
    /// other variants for backend failures.
    async fn load(&self) -> Result<Option<Vec<TrackedProduct>>, StorageError>;

    /// Replaces the stored collection with `products`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the snapshot could not be written.
    async fn save(&self, products: &[TrackedProduct]) -> Result<(), StorageError>;
}

/// Loads the collection, recovering from absence or corruption with an
/// empty one. Never fails.
pub async fn load_or_empty(store: &dyn SnapshotStore) -> Vec<TrackedProduct> {
    match store.load().await {
        Ok(Some(products)) => products,
        Ok(None) => {
            tracing::info!("no product snapshot found, starting empty");
            Vec::new()
        }
        Err(StorageError::Corrupt(reason)) => {
            tracing::warn!(%reason, "discarding corrupt product snapshot");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "product snapshot unavailable, starting empty");
            Vec::new()
        }
    }
}

/// Decodes a JSON array snapshot, repairing empty histories.
///
/// # Errors
///
/// Returns [`StorageError::Corrupt`] if `raw` is not a JSON array of
/// products.
pub fn decode_snapshot(raw: &str) -> Result<Vec<TrackedProduct>, StorageError> {
    let mut products: Vec<TrackedProduct> =
        serde_json::from_str(raw).map_err(|e| StorageError::Corrupt(e.to_string()))?;
    products.iter_mut().for_each(TrackedProduct::ensure_seeded);
    Ok(products)
}

/// Encodes the collection as a JSON array.
///
/// # Errors
///
/// Returns [`StorageError::Serialize`] if encoding fails.
pub fn encode_snapshot(products: &[TrackedProduct]) -> Result<String, StorageError> {
    serde_json::to_string(products).map_err(|e| StorageError::Serialize(e.to_string()))
}
