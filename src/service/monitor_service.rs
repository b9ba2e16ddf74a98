//! Monitor service: price checks, user actions, and their side effects.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::domain::activity_log::short_name;
use crate::domain::{
    ActivityLog, ActivityLogEntry, CheckTrigger, DealCrossing, EventBus, MonitorEvent, ProductId,
    ProductRegistry, ProductSlot, ProductStatus, Severity, TrackedProduct,
};
use crate::error::SentinelError;
use crate::gateway::{self, ExtractionError, ExtractionGateway, PriceQuote};
use crate::notify::{NotificationDispatcher, format_price};
use crate::persistence::{self, SnapshotStore};

/// Timing knobs the engine consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Delay between two checks of the same product.
    pub check_interval: Duration,
    /// Upper bound on any single extraction call.
    pub extraction_timeout: Duration,
}

impl MonitorSettings {
    /// Check interval as a calendar duration (capped at one year).
    #[must_use]
    pub fn check_interval_delta(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.check_interval)
            .ok()
            .filter(|d| *d <= chrono::Duration::days(365))
            .unwrap_or_else(|| chrono::Duration::days(365))
    }

    /// Check interval in whole minutes, for the startup banner.
    #[must_use]
    pub fn check_interval_minutes(&self) -> u64 {
        self.check_interval.as_secs() / 60
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(3600),
            extraction_timeout: Duration::from_secs(30),
        }
    }
}

/// What happened to one product during a check.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// A usable price was observed and applied.
    Updated {
        /// Price before the observation.
        old_price: f64,
        /// Observed price.
        new_price: f64,
        /// The observation moved the product into deal state.
        crossed: bool,
    },
    /// No usable price. Product state, `next_check` included, is unchanged.
    Failed(ExtractionError),
    /// Another check on the product was in flight; this one was dropped.
    Skipped,
    /// A manual refresh waited for an in-flight check and reused its result.
    Coalesced,
    /// The product was removed while the check was in flight.
    Removed,
}

impl CheckOutcome {
    /// Short machine-readable label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Updated { .. } => "updated",
            Self::Failed(ExtractionError::Timeout { .. }) => "timed_out",
            Self::Failed(ExtractionError::InvalidPrice(_)) => "soft_failure",
            Self::Failed(_) => "failed",
            Self::Skipped => "skipped",
            Self::Coalesced => "coalesced",
            Self::Removed => "removed",
        }
    }

    /// `true` for an applied observation whose price differs from before.
    #[must_use]
    pub fn price_changed(&self) -> bool {
        matches!(self, Self::Updated { old_price, new_price, .. } if old_price != new_price)
    }

    /// `true` if the check produced a deal crossing.
    #[must_use]
    pub fn crossed(&self) -> bool {
        matches!(self, Self::Updated { crossed: true, .. })
    }
}

/// Per-product results of one scheduler tick, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Instant the tick evaluated due-ness against.
    pub now: Option<DateTime<Utc>>,
    /// One entry per due product.
    pub outcomes: Vec<(ProductId, CheckOutcome)>,
}

impl TickReport {
    /// `true` when nothing was due.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of due products.
    #[must_use]
    pub fn due(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of applied observations.
    #[must_use]
    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, CheckOutcome::Updated { .. }))
    }

    /// Number of checks without a usable price.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CheckOutcome::Failed(_)))
    }

    /// Number of products skipped because a check was already in flight.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, CheckOutcome::Skipped))
    }

    fn count(&self, pred: impl Fn(&CheckOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Result of a manual refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshReport {
    /// Product state after the refresh.
    pub product: TrackedProduct,
    /// `Updated` or `Coalesced`.
    pub outcome: CheckOutcome,
}

/// Editable product fields. `None` leaves a field as is.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProductChanges {
    /// New strike threshold (must be > 0).
    pub target_price: Option<f64>,
    /// New scheduling status.
    pub status: Option<ProductStatus>,
}

/// Orchestration layer for all monitoring operations.
///
/// Owns the registry, the activity feed and the event bus, and reaches
/// the outside world only through injected capabilities (gateway, store,
/// notifier, clock). Every mutation follows the same pattern: claim the
/// product's check lock → await the gateway (bounded) → apply the pure
/// transition under a short write lock → emit events and activity →
/// notify on crossings → persist the whole collection.
#[derive(Debug, Clone)]
pub struct MonitorService {
    registry: Arc<ProductRegistry>,
    event_bus: EventBus,
    activity: Arc<ActivityLog>,
    gateway: Arc<dyn ExtractionGateway>,
    store: Arc<dyn SnapshotStore>,
    dispatcher: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    settings: MonitorSettings,
    persist_lock: Arc<Mutex<()>>,
}

impl MonitorService {
    /// Creates a service with an empty registry, a default-sized event bus
    /// and activity log.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn ExtractionGateway>,
        store: Arc<dyn SnapshotStore>,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn Clock>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            registry: Arc::new(ProductRegistry::new()),
            event_bus: EventBus::default(),
            activity: Arc::new(ActivityLog::default()),
            gateway,
            store,
            dispatcher,
            clock,
            settings,
            persist_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Replaces the event bus.
    #[must_use]
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Replaces the activity log.
    #[must_use]
    pub fn with_activity_log(mut self, activity: Arc<ActivityLog>) -> Self {
        self.activity = activity;
        self
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner [`ProductRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<ProductRegistry> {
        &self.registry
    }

    /// The injected clock.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Engine timing settings.
    #[must_use]
    pub const fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Loads the persisted collection into the registry.
    ///
    /// Absent or corrupt snapshots yield an empty registry. Duplicate ids
    /// in a snapshot keep the first occurrence. Returns the number of
    /// restored products.
    pub async fn restore(&self) -> usize {
        let mut restored = 0;
        for product in persistence::load_or_empty(self.store.as_ref()).await {
            let id = product.id;
            match self.registry.insert(product).await {
                Ok(_) => restored += 1,
                Err(e) => tracing::warn!(product_id = %id, error = %e, "skipping duplicate product in snapshot"),
            }
        }
        tracing::info!(count = restored, "restored tracked products");
        restored
    }

    /// Records the startup banner in the activity feed.
    pub fn announce_startup(&self) {
        self.note("Price sentinel online", Severity::Success);
        self.note(
            format!(
                "Monitoring every {} minutes",
                self.settings.check_interval_minutes()
            ),
            Severity::Info,
        );
    }

    /// Registers a new product from its page URL.
    ///
    /// # Errors
    ///
    /// - [`SentinelError::InvalidRequest`] if `url` is blank or
    ///   `target_price` is not a positive number;
    /// - [`SentinelError::Extraction`] if the metadata cannot be extracted
    ///   or carries no usable price. Nothing is created in that case.
    pub async fn add_product(
        &self,
        url: &str,
        target_price: f64,
    ) -> Result<TrackedProduct, SentinelError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SentinelError::InvalidRequest("url must not be empty".to_string()));
        }
        validate_target(target_price)?;

        self.note("Fetching product page", Severity::Info);
        let listing = gateway::bounded(
            self.settings.extraction_timeout,
            self.gateway.extract_full(url),
        )
        .await
        .and_then(|listing| {
            let quote = PriceQuote {
                price: listing.price,
            };
            quote.into_price().map(|_| listing)
        });

        let listing = match listing {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!(url, error = %e, "product extraction failed");
                self.note("Extraction failure", Severity::Warn);
                return Err(e.into());
            }
        };

        let now = self.clock.now();
        let (product, crossing) = TrackedProduct::from_listing(
            ProductId::new(),
            url.to_string(),
            listing,
            target_price,
            now,
            self.settings.check_interval_delta(),
        );
        self.registry.insert(product.clone()).await?;

        let _ = self.event_bus.publish(MonitorEvent::ProductAdded {
            product_id: product.id,
            name: product.name.clone(),
            price: product.current_price,
            target_price,
            currency: product.currency.clone(),
            timestamp: now,
        });
        self.note(
            format!("Now tracking {}", short_name(&product.name)),
            Severity::Success,
        );
        tracing::info!(product_id = %product.id, price = product.current_price, target_price, "product added");

        if let Some(crossing) = crossing {
            self.handle_crossing(&crossing).await;
        }
        self.persist().await;
        Ok(product)
    }

    /// Stops tracking a product. Removing an unknown id is a no-op.
    ///
    /// Returns `true` if something was removed.
    pub async fn remove_product(&self, id: ProductId) -> bool {
        if self.registry.remove(id).await.is_none() {
            return false;
        }

        let _ = self.event_bus.publish(MonitorEvent::ProductRemoved {
            product_id: id,
            timestamp: self.clock.now(),
        });
        self.note(format!("Product removed: {}", id.short()), Severity::Warn);
        self.persist().await;
        true
    }

    /// Checks one product immediately, regardless of `next_check`.
    ///
    /// When a check of the same product is already in flight, waits for it
    /// to finish. If that check applied a price, its result is returned as
    /// [`CheckOutcome::Coalesced`] without calling the gateway again;
    /// otherwise this refresh runs its own check.
    ///
    /// # Errors
    ///
    /// - [`SentinelError::ProductNotFound`] if the product does not exist
    ///   or is removed during the check;
    /// - [`SentinelError::Extraction`] if no usable price was obtained.
    pub async fn refresh_now(&self, id: ProductId) -> Result<RefreshReport, SentinelError> {
        let slot = self.registry.get(id).await?;
        // Every applied observation appends exactly one history point.
        let observed = slot.read().await.history.len();

        let guard = match slot.try_begin_check() {
            Some(guard) => guard,
            None => {
                let guard = slot.begin_check().await;
                if slot.is_retired() {
                    return Err(SentinelError::ProductNotFound(*id.as_uuid()));
                }
                let product = slot.snapshot().await;
                if product.history.len() > observed {
                    tracing::debug!(product_id = %id, "manual refresh coalesced with in-flight check");
                    return Ok(RefreshReport {
                        product,
                        outcome: CheckOutcome::Coalesced,
                    });
                }
                tracing::debug!(product_id = %id, "in-flight check applied no price, checking again");
                guard
            }
        };

        let now = self.clock.now();
        let outcome = self.check_locked(id, &slot, now, CheckTrigger::Manual).await;
        drop(guard);

        match outcome {
            CheckOutcome::Failed(e) => Err(e.into()),
            CheckOutcome::Removed => Err(SentinelError::ProductNotFound(*id.as_uuid())),
            outcome => Ok(RefreshReport {
                product: slot.snapshot().await,
                outcome,
            }),
        }
    }

    /// Runs one scheduler pass at `now`.
    ///
    /// Checks every active product with `now >= next_check`, one after the
    /// other, most overdue first. With nothing due this is a no-op: no
    /// activity, no events, no I/O.
    pub async fn tick(&self, now: DateTime<Utc>) -> TickReport {
        let due = self.registry.due(now).await;
        let mut report = TickReport {
            now: Some(now),
            outcomes: Vec::with_capacity(due.len()),
        };

        for (id, slot) in due {
            let Some(guard) = slot.try_begin_check() else {
                tracing::debug!(product_id = %id, "check already in flight, skipping");
                report.outcomes.push((id, CheckOutcome::Skipped));
                continue;
            };

            let name = slot.read().await.name.clone();
            self.note(format!("Checking {}", short_name(&name)), Severity::Info);

            let outcome = self.check_locked(id, &slot, now, CheckTrigger::Scheduled).await;
            drop(guard);
            report.outcomes.push((id, outcome));
        }

        if !report.is_empty() {
            tracing::info!(
                due = report.due(),
                updated = report.updated(),
                failed = report.failed(),
                skipped = report.skipped(),
                "tick complete"
            );
        }
        report
    }

    /// Edits target price and/or status.
    ///
    /// Raising the target over the current price is a crossing and
    /// notifies. Resuming a product leaves `next_check` untouched.
    ///
    /// # Errors
    ///
    /// - [`SentinelError::InvalidRequest`] for a non-positive target or an
    ///   empty change set;
    /// - [`SentinelError::ProductNotFound`] if the product does not exist.
    pub async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<TrackedProduct, SentinelError> {
        if changes.target_price.is_none() && changes.status.is_none() {
            return Err(SentinelError::InvalidRequest(
                "nothing to update: provide target_price and/or status".to_string(),
            ));
        }
        if let Some(target) = changes.target_price {
            validate_target(target)?;
        }

        let slot = self.registry.get(id).await?;
        let now = self.clock.now();

        let (product, crossing) = {
            let mut product = slot.write().await;
            let crossing = changes
                .target_price
                .and_then(|target| product.set_target_price(target, now));
            if let Some(status) = changes.status {
                product.status = status;
            }
            (product.clone(), crossing)
        };

        let _ = self.event_bus.publish(MonitorEvent::ProductUpdated {
            product_id: id,
            target_price: product.target_price,
            status: product.status,
            is_deal: product.is_deal,
            timestamp: now,
        });
        if let Some(target) = changes.target_price {
            self.note(
                format!(
                    "Target set: {} {}{}",
                    short_name(&product.name),
                    product.currency,
                    format_price(target)
                ),
                Severity::Info,
            );
        }
        if let Some(status) = changes.status {
            self.note(
                format!("{} is now {}", short_name(&product.name), status.as_str()),
                Severity::Info,
            );
        }

        if let Some(crossing) = crossing {
            self.handle_crossing(&crossing).await;
        }
        self.persist().await;
        Ok(product)
    }

    /// Changes the strike threshold.
    ///
    /// # Errors
    ///
    /// See [`MonitorService::update_product`].
    pub async fn set_target_price(
        &self,
        id: ProductId,
        target_price: f64,
    ) -> Result<TrackedProduct, SentinelError> {
        self.update_product(
            id,
            ProductChanges {
                target_price: Some(target_price),
                status: None,
            },
        )
        .await
    }

    /// Pauses, resumes or archives a product.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::ProductNotFound`] if the product does not
    /// exist.
    pub async fn set_status(
        &self,
        id: ProductId,
        status: ProductStatus,
    ) -> Result<TrackedProduct, SentinelError> {
        self.update_product(
            id,
            ProductChanges {
                target_price: None,
                status: Some(status),
            },
        )
        .await
    }

    /// Returns one product.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::ProductNotFound`] if it does not exist.
    pub async fn get(&self, id: ProductId) -> Result<TrackedProduct, SentinelError> {
        Ok(self.registry.get(id).await?.snapshot().await)
    }

    /// All products, newest first.
    pub async fn list(&self) -> Vec<TrackedProduct> {
        self.registry.snapshot().await
    }

    /// Products whose name contains `query` (case-insensitive).
    pub async fn search(&self, query: &str) -> Vec<TrackedProduct> {
        self.registry.search(query).await
    }

    /// Activity feed, most recent first.
    #[must_use]
    pub fn activity(&self) -> Vec<ActivityLogEntry> {
        self.activity.snapshot()
    }

    /// Runs one check while the caller holds the product's check lock.
    async fn check_locked(
        &self,
        id: ProductId,
        slot: &ProductSlot,
        now: DateTime<Utc>,
        trigger: CheckTrigger,
    ) -> CheckOutcome {
        let (name, url) = {
            let product = slot.read().await;
            (product.name.clone(), product.url.clone())
        };

        let price = gateway::bounded(
            self.settings.extraction_timeout,
            self.gateway.extract_price(&name, &url),
        )
        .await
        .and_then(PriceQuote::into_price);

        if slot.is_retired() {
            tracing::debug!(product_id = %id, "product removed during check, result discarded");
            return CheckOutcome::Removed;
        }

        let price = match price {
            Ok(price) => price,
            Err(error) => {
                self.record_failure(id, &name, &error, now, trigger);
                return CheckOutcome::Failed(error);
            }
        };

        let (old_price, currency, is_deal, crossing) = {
            let mut product = slot.write().await;
            // Removal retires the slot under this same lock.
            if slot.is_retired() {
                tracing::debug!(product_id = %id, "product removed during check, result discarded");
                return CheckOutcome::Removed;
            }
            let old_price = product.current_price;
            let crossing = product.apply_price(price, now, self.settings.check_interval_delta());
            (old_price, product.currency.clone(), product.is_deal, crossing)
        };

        let _ = self.event_bus.publish(MonitorEvent::PriceChecked {
            product_id: id,
            old_price,
            new_price: price,
            is_deal,
            trigger,
            timestamp: now,
        });

        match trigger {
            CheckTrigger::Scheduled => {
                let severity = if price == old_price {
                    Severity::Info
                } else {
                    Severity::Success
                };
                self.note(
                    format!(
                        "Price synced: {} {currency}{}",
                        short_name(&name),
                        format_price(price)
                    ),
                    severity,
                );
            }
            CheckTrigger::Manual => {
                self.note(
                    format!("Manual sync complete: {}", short_name(&name)),
                    Severity::Success,
                );
            }
        }

        let crossed = crossing.is_some();
        if let Some(crossing) = crossing {
            self.handle_crossing(&crossing).await;
        }
        self.persist().await;

        CheckOutcome::Updated {
            old_price,
            new_price: price,
            crossed,
        }
    }

    fn record_failure(
        &self,
        id: ProductId,
        name: &str,
        error: &ExtractionError,
        now: DateTime<Utc>,
        trigger: CheckTrigger,
    ) {
        tracing::warn!(product_id = %id, trigger = trigger.as_str(), error = %error, "price check failed");
        let _ = self.event_bus.publish(MonitorEvent::CheckFailed {
            product_id: id,
            reason: error.to_string(),
            trigger,
            timestamp: now,
        });
        let message = match trigger {
            CheckTrigger::Scheduled => format!("Sync blocked: {}", short_name(name)),
            CheckTrigger::Manual => format!("Sync failure: {}", short_name(name)),
        };
        self.note(message, Severity::Warn);
    }

    async fn handle_crossing(&self, crossing: &DealCrossing) {
        let _ = self.event_bus.publish(MonitorEvent::DealCrossed {
            product_id: crossing.product_id,
            name: crossing.name.clone(),
            price: crossing.price,
            target_price: crossing.target_price,
            currency: crossing.currency.clone(),
            timestamp: crossing.at,
        });
        let delivered = self.dispatcher.dispatch(crossing).await;
        tracing::info!(product_id = %crossing.product_id, price = crossing.price, delivered, "deal crossing");
        self.note(
            format!("Notification dispatched: {}", short_name(&crossing.name)),
            Severity::Alert,
        );
    }

    /// Records an activity entry and broadcasts it.
    fn note(&self, message: impl Into<String>, severity: Severity) {
        let entry = self.activity.record(message, severity, self.clock.now());
        let _ = self
            .event_bus
            .publish(MonitorEvent::ActivityLogged { entry });
    }

    /// Saves the whole collection. Failures are logged, never rolled back.
    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let products = self.registry.snapshot().await;
        if let Err(e) = self.store.save(&products).await {
            tracing::warn!(error = %e, count = products.len(), "failed to save product snapshot");
            self.note("Snapshot save failed", Severity::Warn);
        }
    }
}

fn validate_target(target_price: f64) -> Result<(), SentinelError> {
    if target_price.is_finite() && target_price > 0.0 {
        Ok(())
    } else {
        Err(SentinelError::InvalidRequest(format!(
            "target_price must be a positive number, got {target_price}"
        )))
    }
}
