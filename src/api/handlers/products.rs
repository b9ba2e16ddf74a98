//! Product handlers: add, list, get, edit, remove, refresh.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CreateProductRequest, PaginationParams, ProductDetailResponse, ProductListResponse,
    RefreshResponse, UpdateProductRequest,
};
use crate::app_state::AppState;
use crate::domain::{ProductId, ProductSummary};
use crate::error::{ErrorResponse, SentinelError};

/// `POST /products`: Start tracking a product.
///
/// # Errors
///
/// Returns [`SentinelError::InvalidRequest`] on a blank URL or a
/// non-positive target, and [`SentinelError::Extraction`] when the page
/// cannot be read.
#[utoipa::path(
    post,
    path = "/api/v1/products",
    tag = "Products",
    summary = "Track a product",
    description = "Extracts name, price, currency, image and platform from the product page and starts monitoring it. If the price is already at or below target, an alert fires immediately.",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product tracked", body = ProductDetailResponse),
        (status = 400, description = "Invalid URL or target price", body = ErrorResponse),
        (status = 502, description = "Extraction failed", body = ErrorResponse),
        (status = 504, description = "Extraction timed out", body = ErrorResponse),
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, SentinelError> {
    let product = state
        .monitor
        .add_product(&req.url, req.target_price)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductDetailResponse::from(&product)),
    ))
}

/// `GET /products`: List tracked products, newest first.
///
/// # Errors
///
/// Never fails in practice; the signature matches the other handlers.
#[utoipa::path(
    get,
    path = "/api/v1/products",
    tag = "Products",
    summary = "List products",
    description = "Returns a paginated list of tracked products with derived statistics, newest first. `q` filters by name, case-insensitively.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated product list", body = ProductListResponse),
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, SentinelError> {
    let products = match params.query() {
        Some(q) => state.monitor.search(q).await,
        None => state.monitor.list().await,
    };
    let summaries: Vec<ProductSummary> = products.iter().map(ProductSummary::from).collect();
    let (data, pagination) = params.paginate(summaries);

    Ok(Json(ProductListResponse { data, pagination }))
}

/// `GET /products/{id}`: Product detail with full history.
///
/// # Errors
///
/// Returns [`SentinelError::ProductNotFound`] if the product does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    tag = "Products",
    summary = "Get product details",
    params(
        ("id" = uuid::Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 200, description = "Product details", body = ProductDetailResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, SentinelError> {
    let product = state.monitor.get(ProductId::from_uuid(id)).await?;
    Ok(Json(ProductDetailResponse::from(&product)))
}

/// `PATCH /products/{id}`: Edit target price and/or status.
///
/// # Errors
///
/// Returns [`SentinelError::InvalidRequest`] for an empty or invalid edit
/// and [`SentinelError::ProductNotFound`] if the product does not exist.
#[utoipa::path(
    patch,
    path = "/api/v1/products/{id}",
    tag = "Products",
    summary = "Edit a product",
    description = "Changes the target price (re-evaluating deal state; raising it over the current price fires an alert) and/or the status (`active`, `paused`, `archived`).",
    params(
        ("id" = uuid::Uuid, Path, description = "Product UUID"),
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product", body = ProductDetailResponse),
        (status = 400, description = "Invalid edit", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, SentinelError> {
    let product = state
        .monitor
        .update_product(ProductId::from_uuid(id), req.into())
        .await?;
    Ok(Json(ProductDetailResponse::from(&product)))
}

/// `DELETE /products/{id}`: Stop tracking a product.
///
/// Idempotent: unknown ids also answer 204.
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    tag = "Products",
    summary = "Remove a product",
    params(
        ("id" = uuid::Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 204, description = "Product removed (or was never tracked)"),
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let _ = state.monitor.remove_product(ProductId::from_uuid(id)).await;
    StatusCode::NO_CONTENT
}

/// `POST /products/{id}/refresh`: Check the price right now.
///
/// # Errors
///
/// Returns [`SentinelError::ProductNotFound`] if the product does not exist
/// and [`SentinelError::Extraction`] if no usable price was obtained.
#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/refresh",
    tag = "Products",
    summary = "Refresh a product's price",
    description = "Queries the current price regardless of the schedule. If a scheduled check of the same product is in flight, waits for it and reports `coalesced` when it applied a price; otherwise checks again.",
    params(
        ("id" = uuid::Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 200, description = "Refresh result", body = RefreshResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 502, description = "Extraction failed", body = ErrorResponse),
        (status = 504, description = "Extraction timed out", body = ErrorResponse),
    )
)]
pub async fn refresh_product(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, SentinelError> {
    let report = state.monitor.refresh_now(ProductId::from_uuid(id)).await?;
    Ok(Json(RefreshResponse::from(&report)))
}

/// Product routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product).get(list_products))
        .route(
            "/products/{id}",
            get(get_product)
                .patch(update_product)
                .delete(delete_product),
        )
        .route("/products/{id}/refresh", post(refresh_product))
}
