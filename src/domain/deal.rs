//! Deal evaluation: level state plus edge-triggered crossings.
//!
//! A product is a *deal* while its price is at or below its target. A
//! *crossing* is the single false → true transition of that state; staying
//! in deal territory across further checks never produces another one.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ProductId;
use super::product::TrackedProduct;

/// Outcome of evaluating one observed price against a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DealEvaluation {
    /// `price <= target`.
    pub is_deal: bool,
    /// The observation moved the product into deal state.
    pub crossed: bool,
}

/// Maps `(price, target, previous deal state)` to the new state.
#[must_use]
pub fn evaluate(price: f64, target_price: f64, was_deal: bool) -> DealEvaluation {
    let is_deal = price <= target_price;
    DealEvaluation {
        is_deal,
        crossed: is_deal && !was_deal,
    }
}

/// A downward crossing of the target price, ready for notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealCrossing {
    /// Product that crossed.
    pub product_id: ProductId,
    /// Product display name.
    pub name: String,
    /// Price that triggered the crossing.
    pub price: f64,
    /// Target in effect at the time.
    pub target_price: f64,
    /// Currency symbol or code.
    pub currency: String,
    /// Product image, used as the alert icon.
    pub image_url: String,
    /// When the crossing was observed.
    pub at: DateTime<Utc>,
}

impl DealCrossing {
    /// Captures the alert payload from a product's current metadata.
    #[must_use]
    pub fn for_product(product: &TrackedProduct, price: f64, at: DateTime<Utc>) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            price,
            target_price: product.target_price,
            currency: product.currency.clone(),
            image_url: product.image_url.clone(),
            at,
        }
    }
}
