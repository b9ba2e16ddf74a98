//! Service layer: business logic orchestration.
//!
//! [`MonitorService`] performs price checks and user actions against the
//! [`super::domain::ProductRegistry`], emitting events through the
//! [`super::domain::EventBus`]. [`MonitorScheduler`] drives its periodic
//! pass from a [`TickSource`].

pub mod monitor_service;
pub mod scheduler;

pub use monitor_service::{
    CheckOutcome, MonitorService, MonitorSettings, ProductChanges, RefreshReport, TickReport,
};
pub use scheduler::{ChannelTicks, IntervalTicks, MonitorScheduler, TickSource};
