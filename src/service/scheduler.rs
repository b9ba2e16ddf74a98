//! Tick loop driving [`MonitorService::tick`].
//!
//! The loop is decoupled from time: a [`TickSource`] says *when* to run a
//! pass and the service's [`crate::clock::Clock`] says *what time it is*.
//! Production uses [`IntervalTicks`]; tests push ticks by hand through
//! [`ChannelTicks`].

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::MonitorService;

/// Something that decides when the next scheduler pass happens.
#[async_trait]
pub trait TickSource: Send + Debug {
    /// Waits for the next tick. Returns `false` once the source is
    /// exhausted and the loop should stop.
    async fn next_tick(&mut self) -> bool;
}

/// Fixed-period ticks from a tokio interval.
///
/// The first tick fires one period after creation. A pass that overruns
/// the period delays the following ticks instead of bursting to catch up.
#[derive(Debug)]
pub struct IntervalTicks {
    interval: Interval,
}

impl IntervalTicks {
    /// Creates a source ticking every `period` (minimum 1 ms).
    #[must_use]
    pub fn new(period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl TickSource for IntervalTicks {
    async fn next_tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Ticks pushed through an mpsc channel. Ends when every sender is gone.
#[derive(Debug)]
pub struct ChannelTicks {
    rx: mpsc::Receiver<()>,
}

impl ChannelTicks {
    /// Creates a source plus the sender that triggers it.
    #[must_use]
    pub fn channel(buffer: usize) -> (mpsc::Sender<()>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self { rx })
    }
}

#[async_trait]
impl TickSource for ChannelTicks {
    async fn next_tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

/// The recurring monitor loop.
#[derive(Debug, Clone)]
pub struct MonitorScheduler {
    service: MonitorService,
}

impl MonitorScheduler {
    /// Creates a scheduler for `service`.
    #[must_use]
    pub fn new(service: MonitorService) -> Self {
        Self { service }
    }

    /// Runs passes until the tick source ends or `shutdown` turns `true`
    /// (or its sender is dropped). Returns the number of passes run.
    ///
    /// A pass in progress is finished before shutdown is observed.
    pub async fn run<T: TickSource>(&self, mut ticks: T, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut passes: u64 = 0;
        tracing::info!("monitor scheduler started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                more = ticks.next_tick() => {
                    if !more {
                        tracing::debug!("tick source exhausted");
                        break;
                    }
                    let now = self.service.clock().now();
                    let report = self.service.tick(now).await;
                    passes = passes.saturating_add(1);
                    if report.is_empty() {
                        tracing::trace!(%now, "tick: nothing due");
                    }
                }
            }
        }

        tracing::info!(passes, "monitor scheduler stopped");
        passes
    }

    /// Spawns [`MonitorScheduler::run`] on the tokio runtime.
    pub fn spawn<T: TickSource + 'static>(
        self,
        ticks: T,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<u64> {
        tokio::spawn(async move { self.run(ticks, shutdown).await })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::gateway::ExtractionGateway;
    use crate::notify::NotificationDispatcher;
    use crate::persistence::{MemorySnapshotStore, SnapshotStore};
    use crate::service::MonitorSettings;
    use crate::testing::{ScriptedGateway, listing};

    fn service(gateway: &Arc<ScriptedGateway>, clock: &Arc<ManualClock>) -> MonitorService {
        MonitorService::new(
            Arc::clone(gateway) as Arc<dyn ExtractionGateway>,
            Arc::new(MemorySnapshotStore::new()) as Arc<dyn SnapshotStore>,
            NotificationDispatcher::disabled(),
            Arc::clone(clock) as Arc<dyn Clock>,
            MonitorSettings::default(),
        )
    }

    #[tokio::test]
    async fn channel_ticks_drive_passes_until_senders_drop() {
        let gateway = Arc::new(ScriptedGateway::new());
        let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
        let service = service(&gateway, &clock);

        gateway.push_listing(listing("Monitor", 300.0));
        let Ok(product) = service.add_product("https://shop.example/m", 250.0).await else {
            panic!("add should succeed");
        };

        let (tx, ticks) = ChannelTicks::channel(4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = MonitorScheduler::new(service.clone()).spawn(ticks, shutdown_rx);

        clock.advance(chrono::Duration::minutes(61));
        gateway.push_price(240.0);
        // The second pass finds nothing due: the first rescheduled the product.
        let _ = tx.send(()).await;
        let _ = tx.send(()).await;
        drop(tx);

        let Ok(passes) = handle.await else {
            panic!("scheduler task should not panic");
        };
        assert_eq!(passes, 2);

        let Ok(after) = service.get(product.id).await else {
            panic!("product should exist");
        };
        assert_eq!(after.current_price, 240.0);
        assert!(after.is_deal);
        assert_eq!(gateway.price_calls(), 1);
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let gateway = Arc::new(ScriptedGateway::new());
        let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
        let (_tx, ticks) = ChannelTicks::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = MonitorScheduler::new(service(&gateway, &clock)).spawn(ticks, shutdown_rx);
        let _ = shutdown_tx.send(true);

        let Ok(passes) = handle.await else {
            panic!("scheduler task should not panic");
        };
        assert_eq!(passes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_ticks_fire_after_one_period() {
        let mut ticks = IntervalTicks::new(Duration::from_secs(60));
        let start = Instant::now();
        assert!(ticks.next_tick().await);
        assert!(start.elapsed() >= Duration::from_secs(60));
    }
}
