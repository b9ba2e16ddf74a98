//! Bounded feed of recent operational events.
//!
//! [`ActivityLog`] keeps the last `capacity` entries, most recent first.
//! It is the user-facing counterpart of the `tracing` output: every record
//! is mirrored there too. Nothing here is persisted.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Default number of retained entries.
pub const DEFAULT_ACTIVITY_CAPACITY: usize = 8;

/// Severity of an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Routine progress.
    Info,
    /// A completed operation.
    Success,
    /// A failed or degraded operation.
    Warn,
    /// A price alert was dispatched.
    Alert,
}

impl Severity {
    /// Returns the severity as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warn => "warn",
            Self::Alert => "alert",
        }
    }
}

/// One line of the activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ActivityLogEntry {
    /// Human-readable message.
    pub message: String,
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
    /// Entry severity.
    pub severity: Severity,
}

/// Fixed-capacity ring of [`ActivityLogEntry`], newest first.
#[derive(Debug)]
pub struct ActivityLog {
    capacity: usize,
    entries: Mutex<VecDeque<ActivityLogEntry>>,
}

impl ActivityLog {
    /// Creates an empty log retaining at most `capacity` entries (min 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Prepends an entry, evicting the oldest on overflow.
    ///
    /// Returns the stored entry so callers can broadcast it.
    pub fn record(
        &self,
        message: impl Into<String>,
        severity: Severity,
        timestamp: DateTime<Utc>,
    ) -> ActivityLogEntry {
        let entry = ActivityLogEntry {
            message: message.into(),
            timestamp,
            severity,
        };

        match severity {
            Severity::Warn => tracing::warn!(severity = severity.as_str(), "{}", entry.message),
            _ => tracing::info!(severity = severity.as_str(), "{}", entry.message),
        }

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.push_front(entry.clone());
        entries.truncate(self.capacity);
        entry
    }

    /// Returns a copy of the current entries, most recent first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ActivityLogEntry> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.iter().cloned().collect()
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of retained entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVITY_CAPACITY)
    }
}

/// Truncates a product name for feed messages (15 characters).
#[must_use]
pub fn short_name(name: &str) -> String {
    name.chars().take(15).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ninth_entry_evicts_the_oldest() {
        let log = ActivityLog::default();
        let now = Utc::now();
        for i in 1..=9 {
            let _ = log.record(format!("entry {i}"), Severity::Info, now);
        }
        let entries = log.snapshot();
        assert_eq!(entries.len(), 8);
        assert_eq!(entries.first().map(|e| e.message.as_str()), Some("entry 9"));
        assert_eq!(entries.last().map(|e| e.message.as_str()), Some("entry 2"));
    }

    #[test]
    fn newest_first() {
        let log = ActivityLog::new(3);
        let now = Utc::now();
        let _ = log.record("a", Severity::Info, now);
        let _ = log.record("b", Severity::Warn, now);
        let messages: Vec<String> = log.snapshot().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn zero_capacity_still_keeps_latest() {
        let log = ActivityLog::new(0);
        let _ = log.record("only", Severity::Success, Utc::now());
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn short_name_respects_char_boundaries() {
        assert_eq!(short_name("Ünïcödé Headphones Pro"), "Ünïcödé Headpho");
        assert_eq!(short_name("TV"), "TV");
    }
}
