//! price-sentinel server entry point.
//!
//! Restores tracked products, starts the monitor scheduler and serves the
//! REST and WebSocket endpoints until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use price_sentinel::app_state::AppState;
use price_sentinel::clock::{Clock, SystemClock};
use price_sentinel::config::{SentinelConfig, SnapshotBackend};
use price_sentinel::domain::{ActivityLog, EventBus};
use price_sentinel::gateway::{ExtractionGateway, HttpExtractionGateway};
use price_sentinel::notify::{LogNotifier, NotificationDispatcher, Notifier, WebhookNotifier};
use price_sentinel::persistence::{
    JsonFileStore, MemorySnapshotStore, PostgresSnapshotStore, SnapshotStore,
};
use price_sentinel::service::{IntervalTicks, MonitorScheduler, MonitorService};
use price_sentinel::{build_app, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = SentinelConfig::from_env().context("loading configuration")?;
    telemetry::init(config.log_format);
    tracing::info!(addr = %config.listen_addr, "starting price-sentinel");

    // Outbound capabilities
    let store = build_store(&config).await?;
    let gateway: Arc<dyn ExtractionGateway> = Arc::new(
        HttpExtractionGateway::new(
            &config.extraction_endpoint,
            config.extraction_api_key.clone(),
            Duration::from_secs(config.extraction_timeout_secs),
        )
        .context("building extraction client")?,
    );
    let dispatcher = build_dispatcher(&config)?;

    // Build service layer
    let monitor = MonitorService::new(
        gateway,
        store,
        dispatcher,
        Arc::new(SystemClock) as Arc<dyn Clock>,
        config.monitor_settings(),
    )
    .with_event_bus(EventBus::new(config.event_bus_capacity))
    .with_activity_log(Arc::new(ActivityLog::new(config.activity_log_capacity)));

    monitor.restore().await;
    monitor.announce_startup();

    // Background scheduler
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = MonitorScheduler::new(monitor.clone())
        .spawn(IntervalTicks::new(config.tick_interval()), shutdown_rx);

    // Build router
    let app = build_app(AppState::new(monitor))
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
        .context("serving HTTP")?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler.await {
        tracing::warn!(error = %e, "scheduler task ended abnormally");
    }
    Ok(())
}

async fn build_store(config: &SentinelConfig) -> anyhow::Result<Arc<dyn SnapshotStore>> {
    let store: Arc<dyn SnapshotStore> = match config.snapshot_backend {
        SnapshotBackend::File => {
            tracing::info!(path = %config.snapshot_path.display(), "using JSON file snapshots");
            Arc::new(JsonFileStore::new(&config.snapshot_path))
        }
        SnapshotBackend::Postgres => {
            tracing::info!("using PostgreSQL snapshots");
            Arc::new(
                PostgresSnapshotStore::connect(
                    &config.database_url,
                    config.database_max_connections,
                    Duration::from_secs(config.database_connect_timeout_secs),
                )
                .await
                .context("connecting to PostgreSQL")?,
            )
        }
        SnapshotBackend::Memory => {
            tracing::warn!("using in-memory snapshots; products are lost on exit");
            Arc::new(MemorySnapshotStore::new())
        }
    };
    Ok(store)
}

fn build_dispatcher(config: &SentinelConfig) -> anyhow::Result<NotificationDispatcher> {
    let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.as_str()).context("building webhook client")?),
        None => Arc::new(LogNotifier),
    };
    Ok(NotificationDispatcher::new(
        notifier,
        config.notifications_enabled,
    ))
}
