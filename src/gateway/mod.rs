//! Extraction gateway: the remote "what does this product cost now" call.
//!
//! The engine depends only on the [`ExtractionGateway`] trait. The
//! production implementation is [`HttpExtractionGateway`], which speaks
//! JSON to an extraction service; tests use
//! [`crate::testing::ScriptedGateway`].

pub mod http;

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ProductListing;

pub use http::HttpExtractionGateway;

/// Failure to obtain usable data from the extraction service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    /// The service could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with an error status or an unusable payload.
    #[error("bad response: {0}")]
    BadResponse(String),

    /// The payload could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// The call exceeded the engine's upper bound.
    #[error("timed out after {after_secs}s")]
    Timeout {
        /// The bound that was exceeded, in seconds.
        after_secs: u64,
    },

    /// The service returned a price that is zero, negative or not finite.
    #[error("no usable price (got {0})")]
    InvalidPrice(f64),
}

/// Result of a lightweight price query.
///
/// A `price` of `0` is how the service says "could not determine"; the
/// engine treats it as a soft failure rather than an observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Current price, or `0` when unknown.
    #[serde(default)]
    pub price: f64,
}

impl PriceQuote {
    /// Returns `true` if the price can be recorded as an observation.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }

    /// Converts an unusable quote into [`ExtractionError::InvalidPrice`].
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidPrice`] when the price is not
    /// strictly positive and finite.
    pub fn into_price(self) -> Result<f64, ExtractionError> {
        if self.is_usable() {
            Ok(self.price)
        } else {
            Err(ExtractionError::InvalidPrice(self.price))
        }
    }
}

/// Remote product data extraction.
#[async_trait]
pub trait ExtractionGateway: Send + Sync + Debug {
    /// Extracts full product metadata from a product page URL.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractionError`] when the metadata cannot be
    /// determined.
    async fn extract_full(&self, url: &str) -> Result<ProductListing, ExtractionError>;

    /// Queries the current price of a known product.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractionError`] when the service fails. A quote with
    /// `price == 0` is not an error at this layer.
    async fn extract_price(&self, name: &str, url: &str) -> Result<PriceQuote, ExtractionError>;
}

/// Runs a gateway call with an upper bound on its duration.
///
/// # Errors
///
/// Returns [`ExtractionError::Timeout`] when `limit` elapses first, or the
/// call's own error.
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, ExtractionError>
where
    F: Future<Output = Result<T, ExtractionError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ExtractionError::Timeout {
            after_secs: limit.as_secs(),
        }),
    }
}
