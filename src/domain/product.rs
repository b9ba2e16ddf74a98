//! Tracked product aggregate and its append-only price history.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ProductId;
use super::deal::{self, DealCrossing};

/// Storefront a product listing was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Platform {
    /// amazon.* storefronts.
    Amazon,
    /// flipkart.com.
    Flipkart,
    /// ebay.* storefronts.
    #[serde(rename = "eBay")]
    Ebay,
    /// Anything the extraction service could not classify.
    #[serde(other)]
    Other,
}

impl Platform {
    /// Returns the display name used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Amazon => "Amazon",
            Self::Flipkart => "Flipkart",
            Self::Ebay => "eBay",
            Self::Other => "Other",
        }
    }
}

/// Scheduling status. Only [`ProductStatus::Active`] products are ever due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Checked by the scheduler whenever due.
    #[default]
    Active,
    /// Kept, but skipped by the scheduler.
    Paused,
    /// Retired from monitoring; retained for its history.
    Archived,
}

impl ProductStatus {
    /// Returns the status as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Archived => "archived",
        }
    }
}

/// A single price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PricePoint {
    /// When the price was observed.
    pub timestamp: DateTime<Utc>,
    /// Observed price in the product's currency.
    pub price: f64,
}

/// Product metadata as reported by a full extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductListing {
    /// Product display name.
    pub name: String,
    /// Current listed price.
    pub price: f64,
    /// Currency symbol or ISO code (e.g. `"$"`, `"INR"`).
    pub currency: String,
    /// Product image URL.
    pub image_url: String,
    /// Storefront the listing belongs to.
    pub platform: Platform,
}

/// A product under price surveillance.
///
/// Owned exclusively by the [`super::ProductRegistry`]; every mutation
/// goes through the monitor service so that `is_deal`, `history` and the
/// check timestamps stay consistent with each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedProduct {
    /// Unique identifier (immutable after creation).
    pub id: ProductId,
    /// Product page URL as registered by the user.
    pub url: String,
    /// Display name from extraction.
    pub name: String,
    /// Product image URL from extraction.
    pub image_url: String,
    /// Storefront classification.
    pub platform: Platform,
    /// Currency symbol or code.
    pub currency: String,
    /// Latest known price.
    pub current_price: f64,
    /// Strike threshold: at or below this price the product is a deal.
    pub target_price: f64,
    /// Every observed price, oldest first. Never empty.
    pub history: Vec<PricePoint>,
    /// `current_price <= target_price` as of the last price update.
    pub is_deal: bool,
    /// Last time a price observation was applied.
    pub last_updated: DateTime<Utc>,
    /// Last time a check completed.
    pub last_checked: DateTime<Utc>,
    /// The product is due once `now >= next_check`.
    pub next_check: DateTime<Utc>,
    /// Scheduling status.
    #[serde(default)]
    pub status: ProductStatus,
}

impl TrackedProduct {
    /// Builds a freshly tracked product from a full extraction.
    ///
    /// History is seeded with the extracted price and the first check is
    /// scheduled one `check_interval` from `now`. The returned crossing is
    /// `Some` when the product is already at or below target: creation
    /// counts as a crossing because there is no earlier non-deal state.
    #[must_use]
    pub fn from_listing(
        id: ProductId,
        url: String,
        listing: ProductListing,
        target_price: f64,
        now: DateTime<Utc>,
        check_interval: Duration,
    ) -> (Self, Option<DealCrossing>) {
        let evaluation = deal::evaluate(listing.price, target_price, false);
        let product = Self {
            id,
            url,
            name: listing.name,
            image_url: listing.image_url,
            platform: listing.platform,
            currency: listing.currency,
            current_price: listing.price,
            target_price,
            history: vec![PricePoint {
                timestamp: now,
                price: listing.price,
            }],
            is_deal: evaluation.is_deal,
            last_updated: now,
            last_checked: now,
            next_check: now + check_interval,
            status: ProductStatus::Active,
        };
        let crossing = evaluation
            .crossed
            .then(|| DealCrossing::for_product(&product, listing.price, now));
        (product, crossing)
    }

    /// Returns `true` if the scheduler should check this product at `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ProductStatus::Active && now >= self.next_check
    }

    /// Applies a successful price observation (update-and-evaluate).
    ///
    /// Appends to history even when the price is unchanged, refreshes all
    /// check timestamps, and returns a crossing only on a false → true
    /// transition of `is_deal`.
    pub fn apply_price(
        &mut self,
        price: f64,
        now: DateTime<Utc>,
        check_interval: Duration,
    ) -> Option<DealCrossing> {
        let evaluation = deal::evaluate(price, self.target_price, self.is_deal);

        self.history.push(PricePoint {
            timestamp: now,
            price,
        });
        self.current_price = price;
        self.last_updated = now;
        self.last_checked = now;
        self.next_check = now + check_interval;
        self.is_deal = evaluation.is_deal;

        evaluation
            .crossed
            .then(|| DealCrossing::for_product(self, price, now))
    }

    /// Changes the strike threshold and re-evaluates deal state against
    /// the current price. Raising the target over the current price is a
    /// crossing.
    pub fn set_target_price(&mut self, target_price: f64, now: DateTime<Utc>) -> Option<DealCrossing> {
        let evaluation = deal::evaluate(self.current_price, target_price, self.is_deal);
        self.target_price = target_price;
        self.is_deal = evaluation.is_deal;
        evaluation
            .crossed
            .then(|| DealCrossing::for_product(self, self.current_price, now))
    }

    /// Restores the non-empty history invariant on snapshots written by
    /// older or hand-edited stores.
    pub fn ensure_seeded(&mut self) {
        if self.history.is_empty() {
            self.history.push(PricePoint {
                timestamp: self.last_updated,
                price: self.current_price,
            });
        }
    }

    /// Price at the first observation (falls back to the current price).
    #[must_use]
    pub fn initial_price(&self) -> f64 {
        self.history
            .first()
            .map_or(self.current_price, |point| point.price)
    }

    /// When the product was first observed.
    #[must_use]
    pub fn first_seen(&self) -> DateTime<Utc> {
        self.history
            .first()
            .map_or(self.last_updated, |point| point.timestamp)
    }

    /// Percent change of the current price relative to the first
    /// observation. Zero when the first observation was zero.
    #[must_use]
    pub fn total_change_pct(&self) -> f64 {
        let initial = self.initial_price();
        if initial == 0.0 {
            return 0.0;
        }
        (self.current_price - initial) / initial * 100.0
    }

    /// Case-insensitive substring match on the product name.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(&query.to_lowercase())
    }
}

/// Read model of a product for list views, with derived statistics.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProductSummary {
    /// Product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Product page URL.
    pub url: String,
    /// Product image URL.
    pub image_url: String,
    /// Storefront.
    pub platform: Platform,
    /// Currency symbol or code.
    pub currency: String,
    /// Latest known price.
    pub current_price: f64,
    /// Strike threshold.
    pub target_price: f64,
    /// Whether the current price meets the target.
    pub is_deal: bool,
    /// Scheduling status.
    pub status: ProductStatus,
    /// Last completed check.
    pub last_checked: DateTime<Utc>,
    /// Next scheduled check.
    pub next_check: DateTime<Utc>,
    /// First observed price.
    pub initial_price: f64,
    /// Change of current price vs the first observation, in percent.
    pub change_pct: f64,
    /// Lowest observed price.
    pub lowest_price: f64,
    /// Highest observed price.
    pub highest_price: f64,
    /// Number of observations in the history.
    pub observations: usize,
}

impl From<&TrackedProduct> for ProductSummary {
    fn from(product: &TrackedProduct) -> Self {
        let (lowest_price, highest_price) = product.history.iter().fold(
            (product.current_price, product.current_price),
            |(lo, hi), point| (lo.min(point.price), hi.max(point.price)),
        );
        Self {
            id: product.id,
            name: product.name.clone(),
            url: product.url.clone(),
            image_url: product.image_url.clone(),
            platform: product.platform,
            currency: product.currency.clone(),
            current_price: product.current_price,
            target_price: product.target_price,
            is_deal: product.is_deal,
            status: product.status,
            last_checked: product.last_checked,
            next_check: product.next_check,
            initial_price: product.initial_price(),
            change_pct: product.total_change_pct(),
            lowest_price,
            highest_price,
            observations: product.history.len(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn listing(price: f64) -> ProductListing {
        ProductListing {
            name: "Noise Cancelling Headphones".to_string(),
            price,
            currency: "$".to_string(),
            image_url: "https://img.example/h.png".to_string(),
            platform: Platform::Amazon,
        }
    }

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default()
    }

    fn product(price: f64, target: f64) -> TrackedProduct {
        TrackedProduct::from_listing(
            ProductId::new(),
            "https://shop.example/p/1".to_string(),
            listing(price),
            target,
            t0(),
            Duration::hours(1),
        )
        .0
    }

    #[test]
    fn creation_above_target_is_not_a_deal() {
        let (p, crossing) = TrackedProduct::from_listing(
            ProductId::new(),
            "u".to_string(),
            listing(600.0),
            500.0,
            t0(),
            Duration::hours(1),
        );
        assert!(!p.is_deal);
        assert!(crossing.is_none());
        assert_eq!(p.history.len(), 1);
        assert_eq!(p.next_check, t0() + Duration::hours(1));
        assert_eq!(p.status, ProductStatus::Active);
    }

    #[test]
    fn creation_at_target_counts_as_crossing() {
        let (p, crossing) = TrackedProduct::from_listing(
            ProductId::new(),
            "u".to_string(),
            listing(500.0),
            500.0,
            t0(),
            Duration::hours(1),
        );
        assert!(p.is_deal);
        let Some(crossing) = crossing else {
            panic!("expected crossing at creation");
        };
        assert_eq!(crossing.price, 500.0);
    }

    #[test]
    fn apply_price_appends_even_when_unchanged() {
        let mut p = product(600.0, 500.0);
        let later = t0() + Duration::minutes(61);
        let crossing = p.apply_price(600.0, later, Duration::hours(1));
        assert!(crossing.is_none());
        assert_eq!(p.history.len(), 2);
        assert_eq!(p.last_checked, later);
        assert_eq!(p.last_updated, later);
        assert_eq!(p.next_check, later + Duration::hours(1));
    }

    #[test]
    fn apply_price_fires_once_per_downward_crossing() {
        let mut p = product(120.0, 100.0);
        let t1 = t0() + Duration::hours(1);
        let t2 = t0() + Duration::hours(2);
        assert!(p.apply_price(90.0, t1, Duration::hours(1)).is_some());
        assert!(p.apply_price(80.0, t2, Duration::hours(1)).is_none());
        assert!(p.is_deal);
    }

    #[test]
    fn leaving_and_reentering_deal_fires_again() {
        let mut p = product(120.0, 100.0);
        let step = Duration::hours(1);
        assert!(p.apply_price(90.0, t0() + step, step).is_some());
        assert!(p.apply_price(110.0, t0() + step * 2, step).is_none());
        assert!(!p.is_deal);
        assert!(p.apply_price(95.0, t0() + step * 3, step).is_some());
    }

    #[test]
    fn raising_target_over_current_price_is_a_crossing() {
        let mut p = product(120.0, 100.0);
        assert!(p.set_target_price(130.0, t0()).is_some());
        assert!(p.is_deal);
        assert_eq!(p.history.len(), 1);
        assert!(p.set_target_price(110.0, t0()).is_none());
        assert!(!p.is_deal);
    }

    #[test]
    fn due_only_when_active_and_past_next_check() {
        let mut p = product(120.0, 100.0);
        assert!(!p.is_due(t0()));
        assert!(p.is_due(p.next_check));
        p.status = ProductStatus::Paused;
        assert!(!p.is_due(p.next_check + Duration::days(1)));
    }

    #[test]
    fn summary_reports_extremes_and_change() {
        let mut p = product(200.0, 100.0);
        let step = Duration::hours(1);
        let _ = p.apply_price(250.0, t0() + step, step);
        let _ = p.apply_price(150.0, t0() + step * 2, step);
        let s = ProductSummary::from(&p);
        assert_eq!(s.initial_price, 200.0);
        assert_eq!(s.lowest_price, 150.0);
        assert_eq!(s.highest_price, 250.0);
        assert_eq!(s.observations, 3);
        assert!((s.change_pct - -25.0).abs() < 1e-9);
    }

    #[test]
    fn ensure_seeded_restores_history() {
        let mut p = product(42.0, 10.0);
        p.history.clear();
        p.ensure_seeded();
        assert_eq!(p.history.len(), 1);
        assert_eq!(p.initial_price(), 42.0);
    }

    #[test]
    fn query_match_is_case_insensitive() {
        let p = product(1.0, 1.0);
        assert!(p.matches_query("headphones"));
        assert!(p.matches_query("NOISE"));
        assert!(!p.matches_query("speaker"));
    }

    #[test]
    fn platform_serializes_with_storefront_names() {
        let json = serde_json::to_string(&Platform::Ebay).unwrap_or_default();
        assert_eq!(json, "\"eBay\"");
        let parsed: Result<Platform, _> = serde_json::from_str("\"Etsy\"");
        let Ok(parsed) = parsed else {
            panic!("unknown platform should map to Other");
        };
        assert_eq!(parsed, Platform::Other);
    }
}
