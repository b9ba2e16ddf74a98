//! Database models for stored snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row from the `product_snapshots` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRow {
    /// Storage key (always [`super::STORAGE_KEY`] for the product collection).
    pub storage_key: String,
    /// The product array as JSONB.
    pub payload: serde_json::Value,
    /// Server-side time of the last save.
    pub saved_at: DateTime<Utc>,
}

impl From<(String, serde_json::Value, DateTime<Utc>)> for SnapshotRow {
    fn from((storage_key, payload, saved_at): (String, serde_json::Value, DateTime<Utc>)) -> Self {
        Self {
            storage_key,
            payload,
            saved_at,
        }
    }
}
