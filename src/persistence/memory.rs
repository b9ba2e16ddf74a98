//! In-process snapshot store.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::{SnapshotStore, StorageError, decode_snapshot, encode_snapshot};
use crate::domain::TrackedProduct;

/// Keeps the encoded snapshot in memory.
///
/// Stores the raw JSON text rather than the products, so it exercises the
/// same encode/decode path as the durable backends and can be seeded with
/// arbitrary (even corrupt) content.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    raw: Mutex<Option<String>>,
    saves: Mutex<usize>,
}

impl MemorySnapshotStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with `raw` snapshot text.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
            saves: Mutex::new(0),
        }
    }

    /// The currently stored snapshot text, if any.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.raw
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times [`SnapshotStore::save`] succeeded.
    #[must_use]
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> Result<Option<Vec<TrackedProduct>>, StorageError> {
        self.raw().map(|raw| decode_snapshot(&raw)).transpose()
    }

    async fn save(&self, products: &[TrackedProduct]) -> Result<(), StorageError> {
        let encoded = encode_snapshot(products)?;
        *self.raw.lock().unwrap_or_else(PoisonError::into_inner) = Some(encoded);
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}
