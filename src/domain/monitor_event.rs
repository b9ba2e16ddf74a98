//! Domain events reflecting product state changes.
//!
//! Every mutation performed by the monitor service emits a
//! [`MonitorEvent`] through the [`super::EventBus`]; WebSocket clients
//! subscribe to them to keep their view of the registry current.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ProductId;
use super::activity_log::ActivityLogEntry;
use super::product::ProductStatus;

/// What started a price check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckTrigger {
    /// The periodic scheduler tick found the product due.
    Scheduled,
    /// A user asked for an immediate refresh.
    Manual,
}

impl CheckTrigger {
    /// Returns the trigger as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
        }
    }
}

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// A product was registered for tracking.
    ProductAdded {
        /// Product identifier.
        product_id: ProductId,
        /// Display name.
        name: String,
        /// Price at registration.
        price: f64,
        /// Strike threshold.
        target_price: f64,
        /// Currency symbol or code.
        currency: String,
        /// Registration timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A product was removed.
    ProductRemoved {
        /// Product identifier.
        product_id: ProductId,
        /// Removal timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A price observation was applied.
    PriceChecked {
        /// Product identifier.
        product_id: ProductId,
        /// Price before the observation.
        old_price: f64,
        /// Observed price.
        new_price: f64,
        /// Whether the product is a deal after the observation.
        is_deal: bool,
        /// What started the check.
        trigger: CheckTrigger,
        /// Observation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The price moved to or below target (edge-triggered).
    DealCrossed {
        /// Product identifier.
        product_id: ProductId,
        /// Display name.
        name: String,
        /// Triggering price.
        price: f64,
        /// Target in effect.
        target_price: f64,
        /// Currency symbol or code.
        currency: String,
        /// Crossing timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A check produced no usable price. Product state is unchanged.
    CheckFailed {
        /// Product identifier.
        product_id: ProductId,
        /// Failure description.
        reason: String,
        /// What started the check.
        trigger: CheckTrigger,
        /// Failure timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Target price or status was edited.
    ProductUpdated {
        /// Product identifier.
        product_id: ProductId,
        /// Target after the edit.
        target_price: f64,
        /// Status after the edit.
        status: ProductStatus,
        /// Deal state after the edit.
        is_deal: bool,
        /// Edit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A line was added to the activity feed.
    ActivityLogged {
        /// The recorded entry.
        entry: ActivityLogEntry,
    },
}

impl MonitorEvent {
    /// Returns the product this event concerns, if any.
    #[must_use]
    pub fn product_id(&self) -> Option<ProductId> {
        match self {
            Self::ProductAdded { product_id, .. }
            | Self::ProductRemoved { product_id, .. }
            | Self::PriceChecked { product_id, .. }
            | Self::DealCrossed { product_id, .. }
            | Self::CheckFailed { product_id, .. }
            | Self::ProductUpdated { product_id, .. } => Some(*product_id),
            Self::ActivityLogged { .. } => None,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::ProductAdded { .. } => "product_added",
            Self::ProductRemoved { .. } => "product_removed",
            Self::PriceChecked { .. } => "price_checked",
            Self::DealCrossed { .. } => "deal_crossed",
            Self::CheckFailed { .. } => "check_failed",
            Self::ProductUpdated { .. } => "product_updated",
            Self::ActivityLogged { .. } => "activity_logged",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::activity_log::Severity;

    #[test]
    fn deal_crossed_serializes_with_tag() {
        let event = MonitorEvent::DealCrossed {
            product_id: ProductId::new(),
            name: "Kettle".to_string(),
            price: 450.0,
            target_price: 500.0,
            currency: "INR".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("\"event_type\":\"deal_crossed\""));
        assert!(json.contains("450"));
    }

    #[test]
    fn activity_events_have_no_product() {
        let event = MonitorEvent::ActivityLogged {
            entry: ActivityLogEntry {
                message: "online".to_string(),
                timestamp: Utc::now(),
                severity: Severity::Success,
            },
        };
        assert!(event.product_id().is_none());
        assert_eq!(event.event_type_str(), "activity_logged");
    }

    #[test]
    fn product_id_accessor() {
        let id = ProductId::new();
        let event = MonitorEvent::CheckFailed {
            product_id: id,
            reason: "timeout".to_string(),
            trigger: CheckTrigger::Scheduled,
            timestamp: Utc::now(),
        };
        assert_eq!(event.product_id(), Some(id));
    }
}
