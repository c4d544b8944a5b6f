//! Common types for metrics exposition

use serde::{Deserialize, Serialize};

use crate::middleware::METRICS_PATH;

/// Configuration for the metrics endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Port for metrics HTTP server
    pub port: u16,

    /// Enable the standalone metrics server
    pub enabled: bool,

    /// Bind address (default: 127.0.0.1)
    pub bind_address: String,

    /// Path the exposition handler is mounted on
    pub path: String,

    /// Namespace applied to request and handler metrics
    pub namespace: Option<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: 9090,
            enabled: false,
            bind_address: "127.0.0.1".to_string(),
            path: METRICS_PATH.to_string(),
            namespace: None,
        }
    }
}

impl MetricsConfig {
    /// Create new config with port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            enabled: true,
            ..Default::default()
        }
    }

    /// Get bind address with port
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_config_default() {
        let config = MetricsConfig::default();
        assert_eq!(config.port, 9090);
        assert!(!config.enabled);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.path, "/metrics");
        assert_eq!(config.namespace, None);
    }

    #[test]
    fn test_metrics_config_with_port() {
        let config = MetricsConfig::with_port(8080);
        assert_eq!(config.port, 8080);
        assert!(config.enabled);
        assert_eq!(config.socket_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: MetricsConfig =
            serde_json::from_str(r#"{"port": 9100, "namespace": "shop"}"#).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.namespace.as_deref(), Some("shop"));
        assert_eq!(config.path, "/metrics");
    }
}
