//! Shared fixtures for the integration suites.

#![allow(dead_code, clippy::panic)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use price_sentinel::clock::{Clock, ManualClock};
use price_sentinel::domain::TrackedProduct;
use price_sentinel::gateway::ExtractionGateway;
use price_sentinel::notify::{NotificationDispatcher, Notifier};
use price_sentinel::persistence::{MemorySnapshotStore, SnapshotStore};
use price_sentinel::service::{MonitorService, MonitorSettings};
use price_sentinel::testing::{RecordingNotifier, ScriptedGateway, listing};

/// A fixed, readable start instant (2026-01-01T00:00:00Z).
pub fn t0() -> DateTime<Utc> {
    let Some(t) = DateTime::from_timestamp(1_767_225_600, 0) else {
        panic!("valid timestamp");
    };
    t
}

/// One full check interval plus a minute.
pub fn past_interval() -> Duration {
    Duration::minutes(61)
}

/// A monitor service wired to scripted collaborators.
pub struct Harness {
    pub service: MonitorService,
    pub gateway: Arc<ScriptedGateway>,
    pub notifier: Arc<RecordingNotifier>,
    pub store: Arc<MemorySnapshotStore>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(
            Arc::new(MemorySnapshotStore::new()),
            Arc::new(RecordingNotifier::new()),
        )
    }

    pub fn with_store(store: Arc<MemorySnapshotStore>) -> Self {
        Self::build(store, Arc::new(RecordingNotifier::new()))
    }

    pub fn with_failing_notifier() -> Self {
        Self::build(
            Arc::new(MemorySnapshotStore::new()),
            Arc::new(RecordingNotifier::failing()),
        )
    }

    fn build(store: Arc<MemorySnapshotStore>, notifier: Arc<RecordingNotifier>) -> Self {
        let gateway = Arc::new(ScriptedGateway::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let service = MonitorService::new(
            Arc::clone(&gateway) as Arc<dyn ExtractionGateway>,
            Arc::clone(&store) as Arc<dyn SnapshotStore>,
            NotificationDispatcher::new(Arc::clone(&notifier) as Arc<dyn Notifier>, true),
            Arc::clone(&clock) as Arc<dyn Clock>,
            MonitorSettings::default(),
        );
        Self {
            service,
            gateway,
            notifier,
            store,
            clock,
        }
    }

    /// Adds a product whose extraction returns `price`.
    pub async fn add(&self, name: &str, price: f64, target: f64) -> TrackedProduct {
        self.gateway.push_listing(listing(name, price));
        let url = format!("https://shop.example/{}", name.to_lowercase().replace(' ', "-"));
        match self.service.add_product(&url, target).await {
            Ok(product) => product,
            Err(e) => panic!("add_product failed: {e}"),
        }
    }

    /// Current state of a product that must exist.
    pub async fn product(&self, product: &TrackedProduct) -> TrackedProduct {
        match self.service.get(product.id).await {
            Ok(p) => p,
            Err(e) => panic!("product lookup failed: {e}"),
        }
    }

    /// Moves the clock past one check interval and returns the new now.
    pub fn advance(&self) -> DateTime<Utc> {
        self.clock.advance(past_interval());
        self.clock.now()
    }
}
