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
//! Tracing subscriber installation.

use crate::config::{LogConfig, LogError, LogFormat, LogOutput};
use std::io;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Initialize tracing with the given format and optional filter.
///
/// Uses defaults for everything else. Without a level, `RUST_LOG` applies.
///
/// # Example
///
/// ```ignore
/// use promkit_observability::{init_tracing, LogFormat};
///
/// init_tracing(LogFormat::Compact, Some("debug"))?;
/// tracing::info!("Application started");
/// ```
pub fn init_tracing(format: LogFormat, level: Option<&str>) -> Result<(), LogError> {
    let mut config = LogConfig::new().with_format(format);
    if let Some(level) = level {
        config = config.with_level(level);
    }
    init_tracing_with_config(config)
}

/// Install the global subscriber described by `config`.
///
/// Fails with [`LogError::AlreadyInitialized`] rather than panicking when a
/// subscriber is already set, so tests and embedding applications can call
/// this more than once.
pub fn init_tracing_with_config(config: LogConfig) -> Result<(), LogError> {
    let env_filter = build_env_filter(&config)?;

    Registry::default()
        .with(build_fmt_layer(&config))
        .with(env_filter)
        .try_init()
        .map_err(|e| LogError::AlreadyInitialized(e.to_string()))
}

fn build_fmt_layer(config: &LogConfig) -> BoxedLayer {
    let base = fmt::layer()
        .with_writer(get_writer(config.output))
        .with_target(config.include_targets)
        .with_thread_ids(config.include_thread_ids);

    match (config.format, config.use_timestamps) {
        (LogFormat::Pretty, true) => base.pretty().with_ansi(config.use_color).boxed(),
        (LogFormat::Pretty, false) => base
            .pretty()
            .without_time()
            .with_ansi(config.use_color)
            .boxed(),
        (LogFormat::Compact, true) => base.compact().with_ansi(config.use_color).boxed(),
        (LogFormat::Compact, false) => base
            .compact()
            .without_time()
            .with_ansi(config.use_color)
            .boxed(),
        (LogFormat::Json, true) => base.json().boxed(),
        (LogFormat::Json, false) => base.json().without_time().boxed(),
    }
}

/// Get the writer for the specified output
fn get_writer(output: LogOutput) -> fn() -> Box<dyn io::Write + Send> {
    match output {
        LogOutput::Stderr => || Box::new(io::stderr()),
        LogOutput::Stdout => || Box::new(io::stdout()),
    }
}

/// Build an environment filter for the given configuration
fn build_env_filter(config: &LogConfig) -> Result<EnvFilter, LogError> {
    let filter = config.effective_level();

    EnvFilter::try_new(&filter).map_err(|e| LogError::InvalidFilter {
        reason: e.to_string(),
        filter,
    })
}
