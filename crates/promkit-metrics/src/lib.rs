//! promkit metrics
//!
//! Prometheus instrument factories, a per-handler metric bundle and an axum
//! middleware recording request count and latency.
//!
//! # Features
//!
//! - **Metric Factory**: labelled counters, gauges, histograms and summaries,
//!   optionally namespaced and optionally auto-registered
//! - **Core Metrics**: request rate, duration and error rate for one handler
//! - **Request Middleware**: per `(method, route, status_code)` count and
//!   latency, skipping the scrape path
//! - **Exposition**: `/metrics` handler in the Prometheus text format
//!
//! There is no global registry: a [`MetricsRegistry`] is created once and
//! handed to everything that registers or exposes metrics.
//!
//! # Example
//!
//! ```ignore
//! use axum::{routing::get, Router};
//! use promkit_metrics::{metrics_router, CoreMetrics, HttpMetrics, MetricsRegistry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = MetricsRegistry::new();
//!     let core = CoreMetrics::new(&registry, "hello")?;
//!     let http = HttpMetrics::new(&registry)?;
//!
//!     let app = Router::new().route("/hello", get(|| async { "hi" }));
//!     let app = http.layer_on(app).merge(metrics_router(registry, "/metrics"));
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod bundle;
pub mod error;
pub mod factory;
pub mod middleware;
pub mod registry;
pub mod server;
pub mod summary;
pub mod types;

pub use bundle::{CoreMetrics, DefaultMetrics};
pub use error::{MetricsError, Result};
pub use factory::MetricFactory;
pub use middleware::{measure, HttpMetrics, METRICS_PATH};
pub use registry::MetricsRegistry;
pub use server::{metrics_handler, metrics_router, MetricsServer};
pub use summary::{Summary, SummaryOpts, SummaryVec};
pub use types::MetricsConfig;

// Re-export prometheus types for convenience
pub use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramVec, TextEncoder, DEFAULT_BUCKETS,
};
