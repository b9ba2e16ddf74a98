//! Scripted collaborators for exercising the engine without a network.
//!
//! [`ScriptedGateway`] replays queued extraction results in order and
//! [`RecordingNotifier`] captures every alert it is asked to show. Both are
//! plain public types so unit tests and the `tests/` suites share them;
//! outside the crate's own tests they need the `testing` feature.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::domain::{Platform, ProductListing};
use crate::gateway::{ExtractionError, ExtractionGateway, PriceQuote};
use crate::notify::{Notification, NotifyError, Notifier};

/// Builds a listing with fixed currency, image and platform.
#[must_use]
pub fn listing(name: &str, price: f64) -> ProductListing {
    ProductListing {
        name: name.to_string(),
        price,
        currency: "$".to_string(),
        image_url: format!("https://img.example/{}.png", name.to_lowercase().replace(' ', "-")),
        platform: Platform::Amazon,
    }
}

#[derive(Debug)]
enum PriceStep {
    Reply(Result<PriceQuote, ExtractionError>),
    Hang,
    Gated(Arc<Notify>, Result<PriceQuote, ExtractionError>),
}

/// An [`ExtractionGateway`] answering from pre-loaded queues.
///
/// An exhausted queue answers with [`ExtractionError::BadResponse`].
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    listings: Mutex<VecDeque<Result<ProductListing, ExtractionError>>>,
    prices: Mutex<VecDeque<PriceStep>>,
    full_calls: AtomicUsize,
    price_calls: AtomicUsize,
    price_started: Notify,
}

impl ScriptedGateway {
    /// Creates a gateway with empty queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful full extraction.
    pub fn push_listing(&self, listing: ProductListing) {
        self.lock_listings().push_back(Ok(listing));
    }

    /// Queues a failed full extraction.
    pub fn push_listing_error(&self, error: ExtractionError) {
        self.lock_listings().push_back(Err(error));
    }

    /// Queues a price answer. `0.0` models "could not determine".
    pub fn push_price(&self, price: f64) {
        self.lock_prices()
            .push_back(PriceStep::Reply(Ok(PriceQuote { price })));
    }

    /// Queues a failed price query.
    pub fn push_price_error(&self, error: ExtractionError) {
        self.lock_prices().push_back(PriceStep::Reply(Err(error)));
    }

    /// Queues a price query that never completes.
    pub fn push_price_hang(&self) {
        self.lock_prices().push_back(PriceStep::Hang);
    }

    /// Queues a price answer that is held back until `gate` is notified.
    pub fn push_price_gated(&self, gate: Arc<Notify>, price: f64) {
        self.lock_prices()
            .push_back(PriceStep::Gated(gate, Ok(PriceQuote { price })));
    }

    /// Number of `extract_full` calls made so far.
    #[must_use]
    pub fn full_calls(&self) -> usize {
        self.full_calls.load(Ordering::SeqCst)
    }

    /// Number of `extract_price` calls made so far.
    #[must_use]
    pub fn price_calls(&self) -> usize {
        self.price_calls.load(Ordering::SeqCst)
    }

    /// Resolves once an `extract_price` call has started (one permit per call).
    pub async fn price_call_started(&self) {
        self.price_started.notified().await;
    }

    fn lock_listings(
        &self,
    ) -> std::sync::MutexGuard<'_, VecDeque<Result<ProductListing, ExtractionError>>> {
        self.listings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_prices(&self) -> std::sync::MutexGuard<'_, VecDeque<PriceStep>> {
        self.prices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ExtractionGateway for ScriptedGateway {
    async fn extract_full(&self, _url: &str) -> Result<ProductListing, ExtractionError> {
        self.full_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.lock_listings().pop_front();
        next.unwrap_or_else(|| Err(ExtractionError::BadResponse("no scripted listing".to_string())))
    }

    async fn extract_price(&self, _name: &str, _url: &str) -> Result<PriceQuote, ExtractionError> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        self.price_started.notify_one();
        let next = self.lock_prices().pop_front();
        match next {
            Some(PriceStep::Reply(result)) => result,
            Some(PriceStep::Hang) => std::future::pending().await,
            Some(PriceStep::Gated(gate, result)) => {
                gate.notified().await;
                result
            }
            None => Err(ExtractionError::BadResponse("no scripted price".to_string())),
        }
    }
}

/// A [`Notifier`] that remembers every alert, optionally failing them all.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    delivered: Mutex<Vec<Notification>>,
    attempts: AtomicUsize,
    fail: bool,
}

impl RecordingNotifier {
    /// Creates a notifier that accepts every alert.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a notifier that rejects every alert.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Alerts accepted so far, in delivery order.
    #[must_use]
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Delivery attempts, including rejected ones.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(NotifyError::Delivery("permission denied".to_string()));
        }
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
        Ok(())
    }
}
