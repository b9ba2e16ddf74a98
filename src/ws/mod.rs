//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams [`crate::domain::MonitorEvent`]s
//! to subscribed clients and accepts a few commands (subscribe, refresh,
//! product and activity lookups).

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
