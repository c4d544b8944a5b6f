//! Summary instrument
//!
//! The prometheus crate ships counters, gauges and histograms but no
//! summary. [`SummaryVec`] fills that gap as a [`Collector`]: every child
//! keeps a cumulative count and sum, and when quantile objectives are
//! configured, a bounded window of the most recent observations from which
//! the quantiles are computed at scrape time.

use prometheus::core::{Collector, Desc};
use prometheus::proto::{LabelPair, Metric, MetricFamily, MetricType, Quantile};
use prometheus::Opts;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::error::{MetricsError, Result};

/// Number of recent observations kept per child for quantile estimation
pub const DEFAULT_MAX_SAMPLES: usize = 500;

/// Label name reserved for quantile samples in the exposition format
const QUANTILE_LABEL: &str = "quantile";

/// Options for building a [`SummaryVec`]
#[derive(Debug, Clone)]
pub struct SummaryOpts {
    /// Name, help, namespace and constant labels
    pub common_opts: Opts,
    /// Quantiles to report, each within `[0.0, 1.0]`
    pub objectives: Vec<f64>,
    /// Size of the per-child observation window
    pub max_samples: usize,
}

impl SummaryOpts {
    /// Summary options with no objectives (count and sum only)
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            common_opts: Opts::new(name, help),
            objectives: Vec::new(),
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }

    /// Set the namespace prefix
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.common_opts = self.common_opts.namespace(namespace);
        self
    }

    /// Set the quantile objectives
    pub fn objectives(mut self, objectives: Vec<f64>) -> Self {
        self.objectives = objectives;
        self
    }

    /// Set the observation window size
    pub fn max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    /// Fully-qualified metric name
    pub fn fq_name(&self) -> String {
        self.common_opts.fq_name()
    }
}

/// A summary partitioned by a fixed set of label names
#[derive(Clone)]
pub struct SummaryVec {
    core: Arc<SummaryVecCore>,
}

struct SummaryVecCore {
    desc: Desc,
    objectives: Vec<f64>,
    max_samples: usize,
    const_labels: Vec<(String, String)>,
    children: RwLock<HashMap<Vec<String>, Summary>>,
}

impl SummaryVec {
    /// Create a summary vector with the given label names
    pub fn new(opts: SummaryOpts, label_names: &[&str]) -> Result<Self> {
        if let Some(bad) = opts
            .objectives
            .iter()
            .copied()
            .find(|q| !(0.0..=1.0).contains(q))
        {
            return Err(MetricsError::InvalidObjective(bad));
        }

        let has_quantile_label = label_names.contains(&QUANTILE_LABEL)
            || opts.common_opts.const_labels.contains_key(QUANTILE_LABEL);
        if has_quantile_label {
            return Err(prometheus::Error::Msg(format!(
                "\"{}\" is reserved for summary quantiles",
                QUANTILE_LABEL
            ))
            .into());
        }

        let desc = Desc::new(
            opts.fq_name(),
            opts.common_opts.help.clone(),
            label_names.iter().map(|l| l.to_string()).collect(),
            opts.common_opts.const_labels.clone(),
        )?;

        let mut objectives = opts.objectives;
        objectives.sort_by(f64::total_cmp);
        objectives.dedup();

        let const_labels = opts.common_opts.const_labels.into_iter().collect();

        Ok(Self {
            core: Arc::new(SummaryVecCore {
                desc,
                objectives,
                max_samples: opts.max_samples,
                const_labels,
                children: RwLock::new(HashMap::new()),
            }),
        })
    }

    /// Label names this summary is partitioned by
    pub fn label_names(&self) -> &[String] {
        &self.core.desc.variable_labels
    }

    /// Configured quantile objectives, ascending
    pub fn objectives(&self) -> &[f64] {
        &self.core.objectives
    }

    /// Get or create the child for the given label values
    pub fn get_metric_with_label_values(&self, values: &[&str]) -> Result<Summary> {
        let expect = self.core.desc.variable_labels.len();
        if values.len() != expect {
            return Err(prometheus::Error::InconsistentCardinality {
                expect,
                got: values.len(),
            }
            .into());
        }

        let key: Vec<String> = values.iter().map(|v| v.to_string()).collect();

        if let Some(child) = self
            .core
            .children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(child.clone());
        }

        let mut children = self
            .core
            .children
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let window = if self.core.objectives.is_empty() {
            0
        } else {
            self.core.max_samples
        };
        let child = children
            .entry(key)
            .or_insert_with(|| Summary::with_window(window));
        Ok(child.clone())
    }

    /// Get or create the child for the given label values
    ///
    /// # Panics
    ///
    /// Panics if the number of values differs from the number of label
    /// names, as the built-in prometheus vectors do.
    pub fn with_label_values(&self, values: &[&str]) -> Summary {
        match self.get_metric_with_label_values(values) {
            Ok(child) => child,
            Err(e) => panic!("summary {}: {}", self.core.desc.fq_name, e),
        }
    }

    /// Drop the child for the given label values
    pub fn remove_label_values(&self, values: &[&str]) -> bool {
        let key: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        self.core
            .children
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key)
            .is_some()
    }

    /// Drop every child
    pub fn reset(&self) {
        self.core
            .children
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn child_metric(&self, values: &[String], child: &Summary) -> Metric {
        let mut pairs: Vec<(&str, &str)> = self
            .core
            .desc
            .variable_labels
            .iter()
            .map(String::as_str)
            .zip(values.iter().map(String::as_str))
            .chain(
                self.core
                    .const_labels
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            )
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));

        let snapshot = child.snapshot();

        let mut summary = prometheus::proto::Summary::default();
        summary.set_sample_count(snapshot.count);
        summary.set_sample_sum(snapshot.sum);
        summary.quantile = self
            .core
            .objectives
            .iter()
            .map(|&q| {
                let mut quantile = Quantile::default();
                quantile.set_quantile(q);
                quantile.set_value(rank(&snapshot.sorted, q).unwrap_or(f64::NAN));
                quantile
            })
            .collect();

        let mut metric = Metric::default();
        metric.label = pairs
            .into_iter()
            .map(|(name, value)| {
                let mut pair = LabelPair::default();
                pair.set_name(name.to_string());
                pair.set_value(value.to_string());
                pair
            })
            .collect();
        *metric.summary.mut_or_insert_default() = summary;
        metric
    }
}

impl Collector for SummaryVec {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.core.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let children = self
            .core
            .children
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let mut metrics: Vec<(&Vec<String>, Metric)> = children
            .iter()
            .map(|(values, child)| (values, self.child_metric(values, child)))
            .collect();
        metrics.sort_by(|a, b| a.0.cmp(b.0));

        let mut family = MetricFamily::default();
        family.set_name(self.core.desc.fq_name.clone());
        family.set_help(self.core.desc.help.clone());
        family.type_ = Some(MetricType::SUMMARY.into());
        family.metric = metrics.into_iter().map(|(_, m)| m).collect();

        vec![family]
    }
}

/// A single summary child bound to one set of label values
#[derive(Clone)]
pub struct Summary {
    state: Arc<Mutex<SummaryState>>,
}

struct SummaryState {
    count: u64,
    sum: f64,
    window: VecDeque<f64>,
    capacity: usize,
}

struct Snapshot {
    count: u64,
    sum: f64,
    sorted: Vec<f64>,
}

impl Summary {
    fn with_window(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(SummaryState {
                count: 0,
                sum: 0.0,
                window: VecDeque::with_capacity(capacity),
                capacity,
            })),
        }
    }

    /// Record one observation
    pub fn observe(&self, value: f64) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.count += 1;
        state.sum += value;
        if state.capacity > 0 {
            if state.window.len() == state.capacity {
                state.window.pop_front();
            }
            state.window.push_back(value);
        }
    }

    /// Number of observations recorded
    pub fn get_sample_count(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .count
    }

    /// Sum of all observations recorded
    pub fn get_sample_sum(&self) -> f64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sum
    }

    /// Quantile over the current observation window
    ///
    /// `None` when the window is empty, including summaries built without
    /// objectives, which keep no window at all.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        rank(&self.snapshot().sorted, q)
    }

    fn snapshot(&self) -> Snapshot {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut sorted: Vec<f64> = state.window.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        Snapshot {
            count: state.count,
            sum: state.sum,
            sorted,
        }
    }
}

/// Nearest-rank quantile of an ascending slice
fn rank(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let idx = ((q * sorted.len() as f64).ceil() as usize).saturating_sub(1);
    sorted.get(idx.min(sorted.len() - 1)).copied()
}
