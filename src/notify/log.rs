//! Notifier that writes alerts to the operator log.

use async_trait::async_trait;

use super::{Notification, NotifyError, Notifier};

/// Emits each alert as a `tracing` event. Used when no external channel
/// is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            product_id = %notification.product_id,
            title = %notification.title,
            icon = %notification.icon,
            "{}",
            notification.body
        );
        Ok(())
    }
}
