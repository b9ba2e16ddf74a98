//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use crate::api::dto::{
    CreateProductRequest, PaginationMeta, ProductDetailResponse, ProductListResponse,
    RefreshResponse, TickResponse, TickResultDto, UpdateProductRequest,
};
use crate::api::handlers::{monitor, products, system};
use crate::domain::{
    ActivityLogEntry, Platform, PricePoint, ProductId, ProductStatus, ProductSummary, Severity,
};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated API description, served at `/api-docs/openapi.json`.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "price-sentinel",
        description = "Scheduled price monitoring and deal detection for e-commerce products."
    ),
    paths(
        products::create_product,
        products::list_products,
        products::get_product,
        products::update_product,
        products::delete_product,
        products::refresh_product,
        monitor::run_tick,
        monitor::list_activity,
        system::health_handler,
    ),
    components(schemas(
        ProductId,
        Platform,
        ProductStatus,
        PricePoint,
        ProductSummary,
        Severity,
        ActivityLogEntry,
        CreateProductRequest,
        UpdateProductRequest,
        ProductDetailResponse,
        ProductListResponse,
        PaginationMeta,
        RefreshResponse,
        TickResultDto,
        TickResponse,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
    )),
    tags(
        (name = "Products", description = "Tracked product management"),
        (name = "Monitor", description = "Scheduler and activity feed"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/products",
            "/api/v1/products/{id}",
            "/api/v1/products/{id}/refresh",
            "/api/v1/monitor/tick",
            "/api/v1/activity",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
