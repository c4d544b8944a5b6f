//! Per-handler metric bundle
//!
//! Every instrumented handler gets the same three metrics, all labelled by
//! HTTP method: request rate, request duration and error rate.

use prometheus::core::Collector;
use prometheus::{GaugeVec, HistogramVec};
use tracing::debug;

use crate::error::Result;
use crate::factory::MetricFactory;
use crate::registry::MetricsRegistry;

const METHOD_LABEL: &[&str] = &["method"];

/// Base metrics added to each handler
#[derive(Clone)]
pub struct CoreMetrics {
    /// `{handler}_request_rate`
    pub request_rate: GaugeVec,
    /// `{handler}_handler_duration_seconds`
    pub request_duration: HistogramVec,
    /// `{handler}_request_error_rate`
    pub error_rate: GaugeVec,
}

/// Alternate name for [`CoreMetrics`]
pub type DefaultMetrics = CoreMetrics;

impl CoreMetrics {
    /// Build and register the bundle for `handler_name`
    ///
    /// Fails with [`crate::MetricsError::AlreadyRegistered`] if a bundle for
    /// the same handler already lives in `registry`; in that case none of the
    /// three metrics is left registered by this call.
    pub fn new(registry: &MetricsRegistry, handler_name: &str) -> Result<Self> {
        let metrics = Self::build(&MetricFactory::new(), handler_name)?;
        metrics.register(registry)?;
        Ok(metrics)
    }

    /// Like [`CoreMetrics::new`] with every name prefixed by `{namespace}_`
    pub fn with_namespace(
        registry: &MetricsRegistry,
        namespace: &str,
        handler_name: &str,
    ) -> Result<Self> {
        let factory = MetricFactory::new().with_namespace(namespace);
        let metrics = Self::build(&factory, handler_name)?;
        metrics.register(registry)?;
        Ok(metrics)
    }

    /// Build the bundle without registering it
    ///
    /// Registration goes through [`CoreMetrics::register`] so the three
    /// metrics succeed or fail together. An auto-registering factory is
    /// stripped of its registry here for the same reason.
    pub fn build(factory: &MetricFactory, handler_name: &str) -> Result<Self> {
        let factory = factory.detached();

        let request_rate = factory.gauge(
            &format!("{}_request_rate", handler_name),
            "The rate of requests per second",
            METHOD_LABEL,
        )?;

        let request_duration = factory.histogram(
            &format!("{}_handler_duration_seconds", handler_name),
            "The request duration in seconds",
            METHOD_LABEL,
        )?;

        let error_rate = factory.gauge(
            &format!("{}_request_error_rate", handler_name),
            "The rate of errors per second",
            METHOD_LABEL,
        )?;

        Ok(Self {
            request_rate,
            request_duration,
            error_rate,
        })
    }

    /// Register all three metrics atomically
    pub fn register(&self, registry: &MetricsRegistry) -> Result<()> {
        registry.register_all(vec![
            Box::new(self.request_rate.clone()),
            Box::new(self.request_duration.clone()),
            Box::new(self.error_rate.clone()),
        ])?;
        debug!(metrics = ?self.names(), "Registered core metrics");
        Ok(())
    }

    /// Fully-qualified names of the three metrics, in declaration order
    pub fn names(&self) -> [String; 3] {
        [
            first_name(&self.request_rate),
            first_name(&self.request_duration),
            first_name(&self.error_rate),
        ]
    }
}

fn first_name(collector: &dyn Collector) -> String {
    collector
        .desc()
        .first()
        .map(|d| d.fq_name.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_names() {
        let registry = MetricsRegistry::new();
        let metrics = CoreMetrics::new(&registry, "upload").unwrap();

        assert_eq!(
            metrics.names(),
            [
                "upload_request_rate".to_string(),
                "upload_handler_duration_seconds".to_string(),
                "upload_request_error_rate".to_string(),
            ]
        );
    }

    #[test]
    fn test_namespaced_bundle_names() {
        let registry = MetricsRegistry::new();
        let metrics = CoreMetrics::with_namespace(&registry, "shop", "upload").unwrap();

        for name in metrics.names() {
            assert!(name.starts_with("shop_upload_"), "{}", name);
        }
    }

    #[test]
    fn test_empty_namespace_matches_plain() {
        let registry = MetricsRegistry::new();
        let metrics = CoreMetrics::with_namespace(&registry, "", "upload").unwrap();
        assert_eq!(metrics.names()[0], "upload_request_rate");
    }

    #[test]
    fn test_duplicate_handler_fails() {
        let registry = MetricsRegistry::new();
        CoreMetrics::new(&registry, "upload").unwrap();

        let err = CoreMetrics::new(&registry, "upload").err().unwrap();
        assert!(err.is_already_registered());
    }

    #[test]
    fn test_same_handler_different_registries() {
        let a = MetricsRegistry::new();
        let b = MetricsRegistry::new();
        assert!(CoreMetrics::new(&a, "upload").is_ok());
        assert!(CoreMetrics::new(&b, "upload").is_ok());
    }

    #[test]
    fn test_partial_clash_leaves_nothing_registered() {
        let registry = MetricsRegistry::new();
        // Occupy only the error-rate name
        let factory = MetricFactory::new().with_registry(registry.clone());
        let blocker = factory
            .gauge(
                "upload_request_error_rate",
                "The rate of errors per second",
                &["method"],
            )
            .unwrap();

        assert!(CoreMetrics::new(&registry, "upload").is_err());

        // Freeing the clash lets the whole bundle register
        registry.unregister(blocker).unwrap();
        assert!(CoreMetrics::new(&registry, "upload").is_ok());
    }

    #[test]
    fn test_metrics_are_usable() {
        let registry = MetricsRegistry::new();
        let metrics = CoreMetrics::new(&registry, "upload").unwrap();

        metrics.request_rate.with_label_values(&["POST"]).set(12.0);
        metrics.request_duration.with_label_values(&["POST"]).observe(0.3);
        metrics.error_rate.with_label_values(&["POST"]).set(0.5);

        let (body, _) = registry.encode_text().unwrap();
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("upload_request_rate{method=\"POST\"} 12"));
        assert!(text.contains("upload_handler_duration_seconds_count{method=\"POST\"} 1"));
        assert!(text.contains("upload_request_error_rate{method=\"POST\"} 0.5"));
    }
}
