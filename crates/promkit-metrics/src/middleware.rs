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
//! HTTP request metrics middleware
//!
//! Records request count and latency for every request, labelled by
//! method, route and status code. Requests to the scrape path are passed
//! through untouched so scraping never measures itself.

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    Router,
};
use prometheus::{GaugeVec, HistogramVec, DEFAULT_BUCKETS};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

use crate::error::Result;
use crate::factory::MetricFactory;
use crate::registry::MetricsRegistry;

/// Path reserved for the exposition handler
pub const METRICS_PATH: &str = "/metrics";

const HTTP_LABELS: &[&str] = &["method", "route", "status_code"];

/// Request count and duration metrics shared by every request
#[derive(Clone)]
pub struct HttpMetrics {
    requests: GaugeVec,
    duration: HistogramVec,
    scrape_path: Arc<str>,
}

impl HttpMetrics {
    /// Build `http_requests_total` and `request_duration_seconds` and
    /// register both with `registry`
    pub fn new(registry: &MetricsRegistry) -> Result<Self> {
        Self::with_factory(&MetricFactory::new(), registry)
    }

    /// Like [`HttpMetrics::new`], naming the metrics through `factory`
    /// (for example to apply a namespace)
    pub fn with_factory(factory: &MetricFactory, registry: &MetricsRegistry) -> Result<Self> {
        let factory = factory.detached();

        let requests = factory.gauge(
            "http_requests_total",
            "Rate of all HTTP requests per second",
            HTTP_LABELS,
        )?;

        let duration = factory.histogram_with_buckets(
            "request_duration_seconds",
            "Time (in seconds) spent serving HTTP requests",
            HTTP_LABELS,
            DEFAULT_BUCKETS.to_vec(),
        )?;

        registry.register_all(vec![
            Box::new(requests.clone()),
            Box::new(duration.clone()),
        ])?;

        Ok(Self {
            requests,
            duration,
            scrape_path: Arc::from(METRICS_PATH),
        })
    }

    /// Exclude `path` instead of [`METRICS_PATH`] from measurement
    pub fn with_scrape_path(mut self, path: impl AsRef<str>) -> Self {
        self.scrape_path = Arc::from(path.as_ref());
        self
    }

    /// Path excluded from measurement
    pub fn scrape_path(&self) -> &str {
        &self.scrape_path
    }

    /// Request count gauge
    pub fn requests(&self) -> &GaugeVec {
        &self.requests
    }

    /// Request duration histogram
    pub fn duration(&self) -> &HistogramVec {
        &self.duration
    }

    /// Record one finished request
    pub fn record(&self, method: &str, route: &str, status: u16, elapsed: Duration) {
        let status = status.to_string();
        let labels = [method, route, status.as_str()];

        self.requests.with_label_values(&labels).inc();
        self.duration
            .with_label_values(&labels)
            .observe(elapsed.as_secs_f64());
    }

    /// Wrap every route of `router` with [`measure`]
    pub fn layer_on<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(self, measure))
    }
}

/// Middleware measuring request count and latency
///
/// Use with [`axum::middleware::from_fn_with_state`]. The downstream
/// response is returned unchanged.
pub async fn measure(
    State(metrics): State<HttpMetrics>,
    request: Request,
    next: Next,
) -> Response {
    if request.uri().path() == metrics.scrape_path() {
        return next.run(request).await;
    }

    let method = request.method().to_string();
    let route = request.uri().path().to_string();

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed();

    let status = response.status().as_u16();
    trace!(%method, %route, status, ?elapsed, "Request measured");
    metrics.record(&method, &route, status, elapsed);

    response
}
