use anyhow::{Context, Result};
use promkit_metrics::{MetricFactory, MetricsConfig};
use promkit_observability::LogConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory by [`ServerConfig::load`]
pub const DEFAULT_CONFIG_FILE: &str = "promkit-server.toml";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Handler name used to derive the core metric names
    #[serde(default = "default_handler")]
    pub handler: String,

    /// Logging setup
    #[serde(default)]
    pub logging: LogConfig,

    /// Exposition path, namespace and optional standalone metrics server
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_handler() -> String {
    "hello".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            handler: default_handler(),
            logging: LogConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from file or use defaults
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from `path`, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Get the full bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Factory applying the configured metrics namespace
    pub fn metric_factory(&self) -> MetricFactory {
        match &self.metrics.namespace {
            Some(namespace) => MetricFactory::new().with_namespace(namespace.as_str()),
            None => MetricFactory::new(),
        }
    }
}
