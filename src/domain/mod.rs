//! Domain layer: product model, deal evaluation, activity feed, and
//! event system.
//!
//! This module holds the server-side model: product identity, the tracked
//! product aggregate with its price history, the pure deal evaluator, the
//! bounded activity log, the event bus that broadcasts state changes, and
//! the registry providing concurrent per-product storage.

pub mod activity_log;
pub mod deal;
pub mod event_bus;
pub mod monitor_event;
pub mod product;
pub mod product_id;
pub mod product_registry;

pub use activity_log::{ActivityLog, ActivityLogEntry, Severity};
pub use deal::{DealCrossing, DealEvaluation};
pub use event_bus::EventBus;
pub use monitor_event::{CheckTrigger, MonitorEvent};
pub use product::{
    Platform, PricePoint, ProductListing, ProductStatus, ProductSummary, TrackedProduct,
};
pub use product_id::ProductId;
pub use product_registry::{ProductRegistry, ProductSlot};
