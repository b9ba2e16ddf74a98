//! PostgreSQL implementation of the snapshot store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::SnapshotRow;
use super::{STORAGE_KEY, SnapshotStore, StorageError};
use crate::domain::TrackedProduct;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS product_snapshots (\
     storage_key TEXT PRIMARY KEY, \
     payload JSONB NOT NULL, \
     saved_at TIMESTAMPTZ NOT NULL DEFAULT now())";

/// PostgreSQL-backed snapshot store using `sqlx::PgPool`.
///
/// The whole collection lives in one `JSONB` row keyed by [`STORAGE_KEY`];
/// each save upserts that row.
#[derive(Debug, Clone)]
pub struct PostgresSnapshotStore {
    pool: PgPool,
}

impl PostgresSnapshotStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and ensures the table exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the connection or the schema
    /// statement fails.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Creates the `product_snapshots` table if it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] on database failure.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }

    /// Loads the raw snapshot row, if one has been saved.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] on database failure.
    pub async fn load_row(&self) -> Result<Option<SnapshotRow>, StorageError> {
        let row = sqlx::query_as::<_, (String, serde_json::Value, DateTime<Utc>)>(
            "SELECT storage_key, payload, saved_at FROM product_snapshots WHERE storage_key = $1",
        )
        .bind(STORAGE_KEY)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(row.map(SnapshotRow::from))
    }
}

#[async_trait]
impl SnapshotStore for PostgresSnapshotStore {
    async fn load(&self) -> Result<Option<Vec<TrackedProduct>>, StorageError> {
        let Some(row) = self.load_row().await? else {
            return Ok(None);
        };

        let mut products: Vec<TrackedProduct> = serde_json::from_value(row.payload)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        products.iter_mut().for_each(TrackedProduct::ensure_seeded);
        tracing::debug!(count = products.len(), saved_at = %row.saved_at, "loaded product snapshot");
        Ok(Some(products))
    }

    async fn save(&self, products: &[TrackedProduct]) -> Result<(), StorageError> {
        let payload =
            serde_json::to_value(products).map_err(|e| StorageError::Serialize(e.to_string()))?;

        sqlx::query(
            "INSERT INTO product_snapshots (storage_key, payload, saved_at) VALUES ($1, $2, now()) \
             ON CONFLICT (storage_key) DO UPDATE SET payload = EXCLUDED.payload, saved_at = EXCLUDED.saved_at",
        )
        .bind(STORAGE_KEY)
        .bind(&payload)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(())
    }
}
