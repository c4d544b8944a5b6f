use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use promkit_metrics::{MetricsRegistry, MetricsServer};
use promkit_observability::{init_tracing_with_config, LogFormat};
use promkit_server::{create_router, spawn_rate_publisher, AppState, ServerConfig, RATE_INTERVAL};

/// Example HTTP service exposing Prometheus metrics
#[derive(Parser, Debug)]
#[command(name = "promkit-server", version, about)]
struct Args {
    /// Config file (default: ./promkit-server.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Handler name used in the core metric names
    #[arg(long)]
    handler: Option<String>,

    /// Prefix for every metric name
    #[arg(long)]
    namespace: Option<String>,

    /// Log format: pretty, compact or json
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Log filter directive, e.g. "info,promkit_metrics=debug"
    #[arg(long)]
    log_level: Option<String>,

    /// Also serve metrics on a standalone port
    #[arg(long)]
    metrics_port: Option<u16>,
}

impl Args {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(handler) = self.handler {
            config.handler = handler;
        }
        if let Some(namespace) = self.namespace {
            config.metrics.namespace = Some(namespace);
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Some(level) = self.log_level {
            config.logging.level = Some(level);
        }
        if let Some(port) = self.metrics_port {
            config.metrics.port = port;
            config.metrics.enabled = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ServerConfig::load_from(path)?,
        None => ServerConfig::load()?,
    };
    args.apply(&mut config);

    init_tracing_with_config(config.logging.clone())?;
    tracing::info!("Server configuration: {:?}", config);

    let registry = MetricsRegistry::new();
    registry
        .register_process_collector()
        .context("Failed to register process metrics")?;

    let state = Arc::new(
        AppState::new(&registry, &config).context("Failed to register handler metrics")?,
    );
    let app = create_router(Arc::clone(&state), &registry, &config)?;
    spawn_rate_publisher(state, RATE_INTERVAL);

    if config.metrics.enabled {
        let metrics_server = MetricsServer::with_config(registry.clone(), config.metrics.clone());
        tokio::spawn(async move {
            if let Err(e) = metrics_server.serve().await {
                tracing::error!("Metrics server stopped: {}", e);
            }
        });
    }

    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!(
        "promkit server listening on http://{} (metrics at {})",
        bind_addr,
        config.metrics.path
    );
    tracing::info!("Press Ctrl+C to stop");

    axum::serve(listener, app).await?;
    Ok(())
}
