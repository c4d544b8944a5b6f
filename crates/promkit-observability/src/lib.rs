//! promkit observability
//!
//! Structured logging setup shared by promkit services.
//!
//! # Features
//!
//! - **Multiple Output Formats**: pretty, compact and JSON
//! - **Environment-based Filtering**: level control via config or `RUST_LOG`
//! - **Non-panicking Setup**: a second initialization returns an error
//!
//! # Example
//!
//! ```ignore
//! use promkit_observability::{init_tracing, LogFormat};
//!
//! init_tracing(LogFormat::Json, Some("info,promkit_metrics=debug"))?;
//! tracing::info!(port = 9090, "Metrics server starting");
//! ```

pub mod config;
pub mod initialization;

pub use config::{LogConfig, LogError, LogFormat, LogOutput};
pub use initialization::{init_tracing, init_tracing_with_config};

/// Tracing re-exports for convenience
pub use tracing::{debug, error, info, span, trace, warn, Level};
