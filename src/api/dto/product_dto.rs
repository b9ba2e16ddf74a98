//! Product DTOs for create, edit, detail, list, refresh and tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::{PricePoint, ProductId, ProductStatus, ProductSummary, TrackedProduct};
use crate::service::{CheckOutcome, ProductChanges, RefreshReport, TickReport};

/// Request body for `POST /products`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    /// Product page URL.
    pub url: String,
    /// Alert when the price is at or below this value.
    pub target_price: f64,
}

/// Request body for `PATCH /products/{id}`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    /// New target price.
    #[serde(default)]
    pub target_price: Option<f64>,
    /// New scheduling status.
    #[serde(default)]
    pub status: Option<ProductStatus>,
}

impl From<UpdateProductRequest> for ProductChanges {
    fn from(req: UpdateProductRequest) -> Self {
        Self {
            target_price: req.target_price,
            status: req.status,
        }
    }
}

/// Full product view: summary fields plus the price history.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductDetailResponse {
    /// Summary and derived statistics.
    #[serde(flatten)]
    pub summary: ProductSummary,
    /// Last time the price value was written.
    pub last_updated: DateTime<Utc>,
    /// Every observation, oldest first.
    pub history: Vec<PricePoint>,
}

impl From<&TrackedProduct> for ProductDetailResponse {
    fn from(product: &TrackedProduct) -> Self {
        Self {
            summary: ProductSummary::from(product),
            last_updated: product.last_updated,
            history: product.history.clone(),
        }
    }
}

/// Paginated list response for `GET /products`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListResponse {
    /// Products on this page, newest first.
    pub data: Vec<ProductSummary>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response body for `POST /products/{id}/refresh`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    /// Product after the refresh.
    pub product: ProductDetailResponse,
    /// `updated` or `coalesced`.
    pub outcome: String,
    /// The observed price differs from the previous one.
    pub price_changed: bool,
    /// The refresh moved the product into deal state.
    pub deal_crossed: bool,
}

impl From<&RefreshReport> for RefreshResponse {
    fn from(report: &RefreshReport) -> Self {
        Self {
            product: ProductDetailResponse::from(&report.product),
            outcome: report.outcome.as_str().to_string(),
            price_changed: report.outcome.price_changed(),
            deal_crossed: report.outcome.crossed(),
        }
    }
}

/// One product's result within a tick.
#[derive(Debug, Serialize, ToSchema)]
pub struct TickResultDto {
    /// Product identifier.
    pub product_id: ProductId,
    /// Outcome label (`updated`, `failed`, `soft_failure`, `timed_out`,
    /// `skipped`, `removed`).
    pub outcome: String,
    /// Failure description, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Response body for `POST /monitor/tick`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TickResponse {
    /// Instant due-ness was evaluated against.
    pub now: Option<DateTime<Utc>>,
    /// Number of due products.
    pub due: usize,
    /// Applied observations.
    pub updated: usize,
    /// Checks without a usable price.
    pub failed: usize,
    /// Products skipped because a check was in flight.
    pub skipped: usize,
    /// Per-product results in processing order.
    pub results: Vec<TickResultDto>,
}

impl From<&TickReport> for TickResponse {
    fn from(report: &TickReport) -> Self {
        Self {
            now: report.now,
            due: report.due(),
            updated: report.updated(),
            failed: report.failed(),
            skipped: report.skipped(),
            results: report
                .outcomes
                .iter()
                .map(|(product_id, outcome)| TickResultDto {
                    product_id: *product_id,
                    outcome: outcome.as_str().to_string(),
                    reason: match outcome {
                        CheckOutcome::Failed(e) => Some(e.to_string()),
                        _ => None,
                    },
                })
                .collect(),
        }
    }
}
