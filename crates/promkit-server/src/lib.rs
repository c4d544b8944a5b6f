// Library exports for promkit-server
// Integration tests drive the router without binding a socket

pub mod config;
pub mod handlers;
pub mod state;

pub use config::ServerConfig;
pub use state::{spawn_rate_publisher, AppState};

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use promkit_metrics::{metrics_router, HttpMetrics, MetricsRegistry};
use std::sync::Arc;
use std::time::Duration;

/// Interval between request rate publications
pub const RATE_INTERVAL: Duration = Duration::from_secs(1);

/// Create the axum router with all endpoints
///
/// Registers the request middleware metrics with `registry`, so this can be
/// called once per registry.
pub fn create_router(
    state: Arc<AppState>,
    registry: &MetricsRegistry,
    config: &ServerConfig,
) -> Result<Router> {
    let http = HttpMetrics::with_factory(&config.metric_factory(), registry)
        .context("Failed to register HTTP metrics")?
        .with_scrape_path(&config.metrics.path);

    let routes = Router::new()
        .route("/hello", get(handlers::hello))
        .route("/hello/{name}", get(handlers::hello_name))
        .route("/fail", get(handlers::fail))
        .route("/health", get(handlers::health))
        .with_state(state);

    let router = routes.merge(metrics_router(registry.clone(), &config.metrics.path));
    Ok(http.layer_on(router))
}
