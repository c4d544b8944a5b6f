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
//! Metric factory
//!
//! Builds labelled counters, gauges, histograms and summaries. A factory
//! optionally carries a namespace (prefixing every name with `{namespace}_`)
//! and a registry that every instrument is registered with as soon as it is
//! built. Without a registry, registration is left to the caller.

use prometheus::core::Collector;
use prometheus::{CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts, DEFAULT_BUCKETS};

use crate::error::Result;
use crate::registry::MetricsRegistry;
use crate::summary::{SummaryOpts, SummaryVec};

/// Builder for labelled metric instruments
#[derive(Clone, Default)]
pub struct MetricFactory {
    namespace: Option<String>,
    buckets: Option<Vec<f64>>,
    registry: Option<MetricsRegistry>,
}

impl MetricFactory {
    /// Factory with no namespace that leaves registration to the caller
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix every metric name with `{namespace}_`
    ///
    /// An empty namespace is treated as no namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.namespace = (!namespace.is_empty()).then_some(namespace);
        self
    }

    /// Register every built instrument with `registry` immediately
    pub fn with_registry(mut self, registry: MetricsRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Histogram buckets used by [`MetricFactory::histogram`]
    pub fn with_buckets(mut self, buckets: Vec<f64>) -> Self {
        self.buckets = Some(buckets);
        self
    }

    /// Copy of this factory that leaves registration to the caller
    pub fn detached(&self) -> Self {
        Self {
            registry: None,
            ..self.clone()
        }
    }

    /// Configured namespace, if any
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Whether instruments are registered as they are built
    pub fn auto_registers(&self) -> bool {
        self.registry.is_some()
    }

    /// Name an instrument called `name` will be exposed under
    pub fn qualified_name(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{}_{}", ns, name),
            None => name.to_string(),
        }
    }

    /// Build a counter vector
    pub fn counter(&self, name: &str, help: &str, labels: &[&str]) -> Result<CounterVec> {
        let metric = CounterVec::new(self.opts(name, help), labels)?;
        self.finish(metric)
    }

    /// Build a gauge vector
    pub fn gauge(&self, name: &str, help: &str, labels: &[&str]) -> Result<GaugeVec> {
        let metric = GaugeVec::new(self.opts(name, help), labels)?;
        self.finish(metric)
    }

    /// Build a histogram vector with the factory's buckets
    pub fn histogram(&self, name: &str, help: &str, labels: &[&str]) -> Result<HistogramVec> {
        let buckets = self
            .buckets
            .clone()
            .unwrap_or_else(|| DEFAULT_BUCKETS.to_vec());
        self.histogram_with_buckets(name, help, labels, buckets)
    }

    /// Build a histogram vector with explicit buckets
    pub fn histogram_with_buckets(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
        buckets: Vec<f64>,
    ) -> Result<HistogramVec> {
        let mut opts = HistogramOpts::new(name, help).buckets(buckets);
        if let Some(ns) = &self.namespace {
            opts = opts.namespace(ns.clone());
        }
        let metric = HistogramVec::new(opts, labels)?;
        self.finish(metric)
    }

    /// Build a summary vector reporting count and sum only
    pub fn summary(&self, name: &str, help: &str, labels: &[&str]) -> Result<SummaryVec> {
        self.summary_with_objectives(name, help, labels, Vec::new())
    }

    /// Build a summary vector reporting the given quantiles
    pub fn summary_with_objectives(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
        objectives: Vec<f64>,
    ) -> Result<SummaryVec> {
        let mut opts = SummaryOpts::new(name, help).objectives(objectives);
        if let Some(ns) = &self.namespace {
            opts = opts.namespace(ns.clone());
        }
        let metric = SummaryVec::new(opts, labels)?;
        self.finish(metric)
    }

    fn opts(&self, name: &str, help: &str) -> Opts {
        let opts = Opts::new(name, help);
        match &self.namespace {
            Some(ns) => opts.namespace(ns.clone()),
            None => opts,
        }
    }

    fn finish<C>(&self, metric: C) -> Result<C>
    where
        C: Collector + Clone + 'static,
    {
        if let Some(registry) = &self.registry {
            registry.register(metric.clone())?;
        }
        Ok(metric)
    }
}
