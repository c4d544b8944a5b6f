//! Shared application state
//!
//! Requests are tallied per method and turned into the per-second rate
//! gauges of [`CoreMetrics`] by a periodic publisher.

use promkit_metrics::{CoreMetrics, MetricsRegistry, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::ServerConfig;

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    requests: u64,
    errors: u64,
}

/// Application state shared by all handlers
pub struct AppState {
    metrics: CoreMetrics,
    tallies: Mutex<HashMap<String, Tally>>,
}

impl AppState {
    /// Build the handler's core metrics and register them with `registry`
    pub fn new(registry: &MetricsRegistry, config: &ServerConfig) -> Result<Self> {
        let metrics = CoreMetrics::build(&config.metric_factory(), &config.handler)?;
        metrics.register(registry)?;

        Ok(Self {
            metrics,
            tallies: Mutex::new(HashMap::new()),
        })
    }

    /// Core metrics of the sample handler
    pub fn metrics(&self) -> &CoreMetrics {
        &self.metrics
    }

    /// Record one handled request
    pub fn record(&self, method: &str, elapsed: Duration, failed: bool) {
        self.metrics
            .request_duration
            .with_label_values(&[method])
            .observe(elapsed.as_secs_f64());

        let mut tallies = self.tallies.lock().unwrap_or_else(PoisonError::into_inner);
        let tally = tallies.entry(method.to_string()).or_default();
        tally.requests += 1;
        if failed {
            tally.errors += 1;
        }
    }

    /// Publish request and error rates over the last `window` and start a
    /// new window
    ///
    /// Methods seen earlier but idle in this window publish zero.
    pub fn publish_rates(&self, window: Duration) {
        let secs = window.as_secs_f64();
        if secs <= 0.0 {
            return;
        }

        let mut tallies = self.tallies.lock().unwrap_or_else(PoisonError::into_inner);
        for (method, tally) in tallies.iter_mut() {
            let labels = [method.as_str()];
            self.metrics
                .request_rate
                .with_label_values(&labels)
                .set(tally.requests as f64 / secs);
            self.metrics
                .error_rate
                .with_label_values(&labels)
                .set(tally.errors as f64 / secs);
            *tally = Tally::default();
        }
        debug!(methods = tallies.len(), "Published request rates");
    }
}

/// Publish rates from `state` every `period` until the task is aborted
pub fn spawn_rate_publisher(state: Arc<AppState>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            state.publish_rates(period);
        }
    })
}
