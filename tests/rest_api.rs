//! REST surface tests driven through the router with `oneshot`.

#![allow(clippy::panic)]

mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use common::Harness;
use price_sentinel::app_state::AppState;
use price_sentinel::build_app;
use price_sentinel::gateway::ExtractionError;
use price_sentinel::testing::listing;

fn app(h: &Harness) -> Router {
    build_app(AppState::new(h.service.clone()))
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    };
    let Ok(request) = request else {
        panic!("request should build");
    };
    let Ok(response) = app.oneshot(request).await else {
        panic!("router is infallible");
    };
    let status = response.status();
    let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
        panic!("body should be readable");
    };
    if bytes.is_empty() {
        return (status, Value::Null);
    }
    let Ok(value) = serde_json::from_slice(&bytes) else {
        panic!("body should be JSON: {}", String::from_utf8_lossy(&bytes));
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_product_count() {
    let h = Harness::new();
    h.add("Coffee Maker", 89.0, 70.0).await;

    let (status, body) = send(app(&h), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["products"], 1);
    assert_eq!(body["check_interval_secs"], 3600);
}

#[tokio::test]
async fn create_then_fetch_product() {
    let h = Harness::new();
    h.gateway.push_listing(listing("Noise Cancelling Headphones", 600.0));

    let (status, created) = send(
        app(&h),
        Method::POST,
        "/api/v1/products",
        Some(json!({ "url": "https://shop.example/headphones", "target_price": 500.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Noise Cancelling Headphones");
    assert_eq!(created["is_deal"], false);
    assert_eq!(created["history"].as_array().map(Vec::len), Some(1));

    let Some(id) = created["id"].as_str() else {
        panic!("id should be a string");
    };
    let (status, fetched) = send(app(&h), Method::GET, &format!("/api/v1/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["url"], "https://shop.example/headphones");
    assert_eq!(fetched["target_price"], 500.0);
}

#[tokio::test]
async fn create_with_bad_target_is_rejected() {
    let h = Harness::new();
    let (status, body) = send(
        app(&h),
        Method::POST,
        "/api/v1/products",
        Some(json!({ "url": "https://shop.example/x", "target_price": -5.0 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1001);
    assert_eq!(h.gateway.full_calls(), 0);
}

#[tokio::test]
async fn create_with_failed_extraction_is_bad_gateway() {
    let h = Harness::new();
    h.gateway
        .push_listing_error(ExtractionError::Parse("no price element".to_string()));

    let (status, body) = send(
        app(&h),
        Method::POST,
        "/api/v1/products",
        Some(json!({ "url": "https://shop.example/x", "target_price": 10.0 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], 5001);
    assert!(h.service.list().await.is_empty());
}

#[tokio::test]
async fn unknown_product_is_404() {
    let h = Harness::new();
    let uri = format!("/api/v1/products/{}", uuid::Uuid::new_v4());
    let (status, body) = send(app(&h), Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 2001);
}

#[tokio::test]
async fn list_filters_by_query_and_paginates() {
    let h = Harness::new();
    h.add("Red Kettle", 40.0, 30.0).await;
    h.clock.advance(chrono::Duration::seconds(1));
    h.add("Blue Kettle", 45.0, 30.0).await;
    h.clock.advance(chrono::Duration::seconds(1));
    h.add("Toaster", 35.0, 25.0).await;

    let (status, body) = send(app(&h), Method::GET, "/api/v1/products?q=KETTLE", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .map(|items| items.iter().filter_map(|p| p["name"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names, vec!["Blue Kettle", "Red Kettle"]);

    let (_, page) = send(app(&h), Method::GET, "/api/v1/products?page=2&per_page=2", None).await;
    assert_eq!(page["pagination"]["total"], 3);
    assert_eq!(page["pagination"]["total_pages"], 2);
    assert_eq!(page["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(page["data"][0]["name"], "Red Kettle");
}

#[tokio::test]
async fn patch_changes_target_and_status() {
    let h = Harness::new();
    let product = h.add("Bike Light", 30.0, 20.0).await;
    let uri = format!("/api/v1/products/{}", product.id);

    let (status, body) = send(
        app(&h),
        Method::PATCH,
        &uri,
        Some(json!({ "target_price": 35.0, "status": "paused" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_deal"], true);
    assert_eq!(body["status"], "paused");
    assert_eq!(h.notifier.delivered().len(), 1);

    let (status, _) = send(app(&h), Method::PATCH, &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let h = Harness::new();
    let product = h.add("Yoga Mat", 25.0, 20.0).await;
    let uri = format!("/api/v1/products/{}", product.id);

    let (first, _) = send(app(&h), Method::DELETE, &uri, None).await;
    let (second, _) = send(app(&h), Method::DELETE, &uri, None).await;
    assert_eq!(first, StatusCode::NO_CONTENT);
    assert_eq!(second, StatusCode::NO_CONTENT);
    assert!(h.service.list().await.is_empty());
}

#[tokio::test]
async fn refresh_reports_crossing() {
    let h = Harness::new();
    let product = h.add("Drone", 500.0, 450.0).await;
    h.gateway.push_price(420.0);

    let uri = format!("/api/v1/products/{}/refresh", product.id);
    let (status, body) = send(app(&h), Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "updated");
    assert_eq!(body["price_changed"], true);
    assert_eq!(body["deal_crossed"], true);
    assert_eq!(body["product"]["current_price"], 420.0);
}

#[tokio::test]
async fn refresh_failure_is_bad_gateway() {
    let h = Harness::new();
    let product = h.add("Projector", 700.0, 600.0).await;
    h.gateway
        .push_price_error(ExtractionError::Network("dns failure".to_string()));

    let uri = format!("/api/v1/products/{}/refresh", product.id);
    let (status, _) = send(app(&h), Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn manual_tick_checks_due_products() {
    let h = Harness::new();
    let product = h.add("Blender", 120.0, 100.0).await;
    h.advance();
    h.gateway.push_price(95.0);

    let (status, body) = send(app(&h), Method::POST, "/api/v1/monitor/tick", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["due"], 1);
    assert_eq!(body["updated"], 1);
    assert_eq!(body["results"][0]["product_id"], product.id.to_string());
    assert_eq!(body["results"][0]["outcome"], "updated");
}

#[tokio::test]
async fn activity_is_most_recent_first() {
    let h = Harness::new();
    h.add("Kindle", 99.0, 80.0).await;

    let (status, body) = send(app(&h), Method::GET, "/api/v1/activity", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["message"], "Now tracking Kindle");
    assert_eq!(body[0]["severity"], "success");
    assert_eq!(body[1]["message"], "Fetching product page");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let h = Harness::new();
    let (status, body) = send(app(&h), Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/products"].is_object());
}
