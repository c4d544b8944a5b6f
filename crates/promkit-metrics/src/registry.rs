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
//! Metrics registry shared by factories, bundles and the HTTP middleware

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::{debug, warn};

use crate::error::{MetricsError, Result};

/// Registry of metric collectors exposed for scraping
///
/// Thin handle around [`prometheus::Registry`]. Clones share the same
/// underlying collectors, so one registry can be handed to every
/// constructor and to the middleware without any process-wide global.
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    registry: Registry,
}

impl MetricsRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    /// Create a registry that prefixes every gathered metric name with `prefix_`
    pub fn with_prefix(prefix: impl Into<String>) -> Result<Self> {
        let registry = Registry::new_custom(Some(prefix.into()), None)?;
        Ok(Self { registry })
    }

    /// Wrap an existing prometheus registry
    pub fn from_registry(registry: Registry) -> Self {
        Self { registry }
    }

    /// Get reference to Prometheus registry for gathering metrics
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register a single collector
    ///
    /// A collector whose name is already registered yields
    /// [`MetricsError::AlreadyRegistered`]; the caller decides whether that
    /// is fatal.
    pub fn register<C>(&self, collector: C) -> Result<()>
    where
        C: Collector + 'static,
    {
        let names = collector_names(&collector);
        match self.registry.register(Box::new(collector)) {
            Ok(()) => {
                debug!(metrics = %names, "Registered collector");
                Ok(())
            }
            Err(prometheus::Error::AlreadyReg) => {
                warn!(metrics = %names, "Duplicate metric registration");
                Err(MetricsError::AlreadyRegistered(names))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Register several collectors as one unit
    ///
    /// If any registration fails, collectors registered by this call are
    /// removed again before the error is returned.
    pub fn register_all(&self, collectors: Vec<Box<dyn Collector>>) -> Result<()> {
        let mut registered: Vec<RegisteredDescs> = Vec::with_capacity(collectors.len());

        for collector in collectors {
            let descs = RegisteredDescs::of(collector.as_ref());
            let names = collector_names(collector.as_ref());

            let outcome = match self.registry.register(collector) {
                Ok(()) => Ok(()),
                Err(prometheus::Error::AlreadyReg) => {
                    Err(MetricsError::AlreadyRegistered(names.clone()))
                }
                Err(e) => Err(MetricsError::from(e)),
            };

            if let Err(err) = outcome {
                warn!(metrics = %names, error = %err, "Rolling back partial registration");
                for done in registered {
                    if let Err(e) = self.registry.unregister(Box::new(done)) {
                        warn!("Failed to roll back collector: {}", e);
                    }
                }
                return Err(err);
            }

            debug!(metrics = %names, "Registered collector");
            registered.push(descs);
        }

        Ok(())
    }

    /// Remove a previously registered collector
    pub fn unregister<C>(&self, collector: C) -> Result<()>
    where
        C: Collector + 'static,
    {
        self.registry.unregister(Box::new(collector))?;
        Ok(())
    }

    /// Register the process collector (CPU, memory, file descriptors)
    ///
    /// Only available on Linux; elsewhere this is a no-op.
    pub fn register_process_collector(&self) -> Result<()> {
        #[cfg(target_os = "linux")]
        {
            let collector = prometheus::process_collector::ProcessCollector::for_self();
            self.register(collector)?;
        }
        Ok(())
    }

    /// Gather all metric families currently held by the registry
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Encode the registry contents in the Prometheus text exposition format
    ///
    /// Returns the encoded body and its content type.
    pub fn encode_text(&self) -> Result<(Vec<u8>, String)> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();

        encoder
            .encode(&families, &mut buffer)
            .map_err(|e| MetricsError::Encode(e.to_string()))?;

        Ok((buffer, encoder.format_type().to_string()))
    }
}

/// Comma separated fully-qualified names of a collector's descriptors
fn collector_names(collector: &dyn Collector) -> String {
    collector
        .desc()
        .iter()
        .map(|d| d.fq_name.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Descriptor-only stand-in used to unregister a collector during rollback
///
/// The prometheus registry identifies collectors by their descriptor ids, so
/// a collector carrying the same descriptors is enough to remove the registered one.
struct RegisteredDescs(Vec<Desc>);

impl RegisteredDescs {
    fn of(collector: &dyn Collector) -> Self {
        Self(collector.desc().into_iter().cloned().collect())
    }
}

impl Collector for RegisteredDescs {
    fn desc(&self) -> Vec<&Desc> {
        self.0.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{GaugeVec, IntCounter, Opts};

    #[test]
    fn test_register_and_gather() {
        let registry = MetricsRegistry::new();
        let counter = IntCounter::new("jobs_total", "Jobs processed").unwrap();
        registry.register(counter.clone()).unwrap();

        counter.inc();
        let families = registry.gather();
        assert_eq!(families.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_is_an_error() {
        let registry = MetricsRegistry::new();
        let first = IntCounter::new("jobs_total", "Jobs processed").unwrap();
        let second = IntCounter::new("jobs_total", "Jobs processed").unwrap();

        registry.register(first).unwrap();
        let err = registry.register(second).unwrap_err();
        assert!(err.is_already_registered());
        assert!(err.to_string().contains("jobs_total"));
    }

    #[test]
    fn test_register_all_rolls_back_on_failure() {
        let registry = MetricsRegistry::new();
        let taken = IntCounter::new("taken_total", "Already present").unwrap();
        registry.register(taken).unwrap();

        let fresh = GaugeVec::new(Opts::new("fresh", "Not yet registered"), &["method"]).unwrap();
        let clash = IntCounter::new("taken_total", "Already present").unwrap();

        let result = registry.register_all(vec![Box::new(fresh.clone()), Box::new(clash)]);
        assert!(result.unwrap_err().is_already_registered());

        // The first collector of the failed batch must be free again
        registry.register(fresh).unwrap();
    }

    #[test]
    fn test_unregister_frees_the_name() {
        let registry = MetricsRegistry::new();
        let counter = IntCounter::new("jobs_total", "Jobs processed").unwrap();
        registry.register(counter.clone()).unwrap();
        registry.unregister(counter).unwrap();

        let again = IntCounter::new("jobs_total", "Jobs processed").unwrap();
        assert!(registry.register(again).is_ok());
    }

    #[test]
    fn test_clones_share_collectors() {
        let registry = MetricsRegistry::new();
        let shared = registry.clone();
        let counter = IntCounter::new("jobs_total", "Jobs processed").unwrap();
        shared.register(counter.clone()).unwrap();
        counter.inc();

        assert_eq!(registry.gather().len(), 1);
    }

    #[test]
    fn test_prefixed_registry() {
        let registry = MetricsRegistry::with_prefix("app").unwrap();
        let counter = IntCounter::new("jobs_total", "Jobs processed").unwrap();
        registry.register(counter.clone()).unwrap();
        counter.inc();

        let (body, _) = registry.encode_text().unwrap();
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("app_jobs_total 1"));
    }

    #[test]
    fn test_encode_text_content_type() {
        let registry = MetricsRegistry::new();
        let (body, content_type) = registry.encode_text().unwrap();
        assert!(body.is_empty());
        assert!(content_type.starts_with("text/plain"));
    }
}
