//! Error types for metric construction and registration

use thiserror::Error;

/// Errors raised while building, registering or exposing metrics
#[derive(Error, Debug)]
pub enum MetricsError {
    /// A collector with the same fully-qualified name is already registered
    #[error("Metric already registered: {0}")]
    AlreadyRegistered(String),

    /// Rejected by the prometheus client (invalid name, label mismatch, ...)
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// Text exposition failed
    #[error("Failed to encode metrics: {0}")]
    Encode(String),

    /// Summary objectives must lie in `[0.0, 1.0]`
    #[error("Invalid summary objective {0}: quantiles must be within [0.0, 1.0]")]
    InvalidObjective(f64),
}

impl MetricsError {
    /// Whether this error is a duplicate-name registration
    pub fn is_already_registered(&self) -> bool {
        matches!(self, MetricsError::AlreadyRegistered(_))
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, MetricsError>;
