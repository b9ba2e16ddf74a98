//! # price-sentinel
//!
//! Scheduled price monitoring and deal detection for e-commerce products.
//!
//! Users register product page URLs with a target price. The engine
//! re-queries each product's live price through an external extraction
//! service on a fixed interval, records every observation in a price
//! history, and alerts once each time the price drops to or below target.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── MonitorService + MonitorScheduler (service/)
//!     ├── EventBus, ActivityLog (domain/)
//!     │
//!     ├── ProductRegistry (domain/)
//!     ├── ExtractionGateway (gateway/)   NotificationDispatcher (notify/)
//!     │
//!     └── SnapshotStore: JSON file | PostgreSQL | memory (persistence/)
//! ```
//!
//! The core (`domain`, `service`, `gateway`, `notify`, `persistence`,
//! `clock`) is usable as a library without the HTTP shell.

pub mod api;
pub mod app_state;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod persistence;
pub mod service;
pub mod telemetry;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod ws;

use axum::Router;
use axum::routing::get;

use crate::app_state::AppState;

/// Builds the full HTTP application (REST, docs and `/ws`) without
/// transport layers.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws::handler::ws_handler))
        .with_state(state)
}
