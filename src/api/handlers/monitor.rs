//! Monitor handlers: on-demand scheduler pass and activity feed.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::TickResponse;
use crate::app_state::AppState;
use crate::domain::ActivityLogEntry;

/// `POST /monitor/tick`: Run one scheduler pass now.
#[utoipa::path(
    post,
    path = "/api/v1/monitor/tick",
    tag = "Monitor",
    summary = "Run a scheduler pass",
    description = "Checks every active product whose next check is due, exactly as the background scheduler would.",
    responses(
        (status = 200, description = "Pass report", body = TickResponse),
    )
)]
pub async fn run_tick(State(state): State<AppState>) -> impl IntoResponse {
    let now = state.monitor.clock().now();
    let report = state.monitor.tick(now).await;
    Json(TickResponse::from(&report))
}

/// `GET /activity`: Recent activity, most recent first.
#[utoipa::path(
    get,
    path = "/api/v1/activity",
    tag = "Monitor",
    summary = "Activity feed",
    description = "Returns the bounded activity log, most recent entry first.",
    responses(
        (status = 200, description = "Activity entries", body = Vec<ActivityLogEntry>),
    )
)]
pub async fn list_activity(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.monitor.activity())
}

/// Monitor routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/monitor/tick", post(run_tick))
        .route("/activity", get(list_activity))
}
