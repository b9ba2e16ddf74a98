//! Best-effort user alerts for deal crossings.
//!
//! [`NotificationDispatcher`] turns a [`DealCrossing`] into a
//! [`Notification`] and hands it to the configured [`Notifier`]. Delivery
//! failures never reach the caller: they are logged and dropped, so a
//! broken alert channel cannot disturb price monitoring.

pub mod log;
pub mod webhook;

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{DealCrossing, ProductId};

pub use log::LogNotifier;
pub use webhook::WebhookNotifier;

/// Upper bound on a single delivery attempt.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Why an alert could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    /// The environment does not allow notifications.
    #[error("notifications are disabled")]
    Disabled,

    /// The channel rejected or failed the delivery.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// User-facing alert content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// Product the alert is about.
    pub product_id: ProductId,
    /// Alert title.
    pub title: String,
    /// Alert body.
    pub body: String,
    /// Icon URL (the product image).
    pub icon: String,
    /// Triggering price.
    pub price: f64,
    /// Currency symbol or code.
    pub currency: String,
}

impl Notification {
    /// Builds the alert shown for a downward crossing.
    #[must_use]
    pub fn for_crossing(crossing: &DealCrossing) -> Self {
        Self {
            product_id: crossing.product_id,
            title: "Price target reached".to_string(),
            body: format!(
                "{} dropped to {}{}!",
                crossing.name,
                crossing.currency,
                format_price(crossing.price)
            ),
            icon: crossing.image_url.clone(),
            price: crossing.price,
            currency: crossing.currency.clone(),
        }
    }
}

/// Renders a price without a trailing `.0` for whole amounts.
#[must_use]
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 && price.abs() < 1e15 {
        format!("{price:.0}")
    } else {
        format!("{price:.2}")
    }
}

/// A channel that can show an alert to the user.
#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    /// Delivers one alert.
    ///
    /// # Errors
    ///
    /// Returns a [`NotifyError`] if the channel refuses or fails.
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Fires alerts for crossings, swallowing every failure.
///
/// The `enabled` flag is the environment's notification capability,
/// determined once at startup.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    enabled: bool,
}

impl NotificationDispatcher {
    /// Creates a dispatcher delivering through `notifier` when `enabled`.
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>, enabled: bool) -> Self {
        Self { notifier, enabled }
    }

    /// A dispatcher that never delivers anything.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Arc::new(LogNotifier), false)
    }

    /// Returns `true` if alerts will be attempted.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Attempts to deliver an alert for `crossing`.
    ///
    /// Returns `true` if the notifier accepted it. Every failure, including
    /// a disabled capability or a delivery timeout, yields `false`.
    pub async fn dispatch(&self, crossing: &DealCrossing) -> bool {
        match self.try_dispatch(crossing).await {
            Ok(()) => true,
            Err(NotifyError::Disabled) => {
                tracing::debug!(product_id = %crossing.product_id, "notifications disabled, alert skipped");
                false
            }
            Err(e) => {
                tracing::warn!(product_id = %crossing.product_id, error = %e, "alert delivery failed");
                false
            }
        }
    }

    async fn try_dispatch(&self, crossing: &DealCrossing) -> Result<(), NotifyError> {
        if !self.enabled {
            return Err(NotifyError::Disabled);
        }
        let notification = Notification::for_crossing(crossing);
        match tokio::time::timeout(DELIVERY_TIMEOUT, self.notifier.notify(&notification)).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Delivery("timed out".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingNotifier;
    use chrono::Utc;

    fn crossing(price: f64) -> DealCrossing {
        DealCrossing {
            product_id: ProductId::new(),
            name: "Espresso Machine".to_string(),
            price,
            target_price: 300.0,
            currency: "$".to_string(),
            image_url: "https://img/e.png".to_string(),
            at: Utc::now(),
        }
    }

    #[test]
    fn notification_body_names_product_and_price() {
        let n = Notification::for_crossing(&crossing(249.0));
        assert_eq!(n.body, "Espresso Machine dropped to $249!");
        assert_eq!(n.icon, "https://img/e.png");
    }

    #[test]
    fn fractional_prices_keep_two_decimals() {
        assert_eq!(format_price(19.5), "19.50");
        assert_eq!(format_price(1200.0), "1200");
    }

    #[tokio::test]
    async fn dispatch_delivers_when_enabled() {
        let notifier = Arc::new(RecordingNotifier::new());
        let dispatcher = NotificationDispatcher::new(Arc::clone(&notifier) as Arc<dyn Notifier>, true);
        assert!(dispatcher.dispatch(&crossing(100.0)).await);
        assert_eq!(notifier.delivered().len(), 1);
    }

    #[tokio::test]
    async fn dispatch_skips_when_disabled() {
        let notifier = Arc::new(RecordingNotifier::new());
        let dispatcher =
            NotificationDispatcher::new(Arc::clone(&notifier) as Arc<dyn Notifier>, false);
        assert!(!dispatcher.dispatch(&crossing(100.0)).await);
        assert!(notifier.delivered().is_empty());
    }

    #[tokio::test]
    async fn dispatch_swallows_delivery_errors() {
        let notifier = Arc::new(RecordingNotifier::failing());
        let dispatcher = NotificationDispatcher::new(Arc::clone(&notifier) as Arc<dyn Notifier>, true);
        assert!(!dispatcher.dispatch(&crossing(100.0)).await);
        assert_eq!(notifier.attempts(), 1);
    }
}
