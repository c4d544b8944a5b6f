// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 promkit Contributors

//! Global subscriber installation
//!
//! Kept to a single test so it owns the process-wide subscriber.

use promkit_observability::{init_tracing, init_tracing_with_config, LogConfig, LogError, LogFormat};

#[test]
fn test_second_initialization_is_an_error() {
    let config = LogConfig::new()
        .with_format(LogFormat::Compact)
        .with_level("debug")
        .with_color(false);
    init_tracing_with_config(config).unwrap();
    tracing::debug!("subscriber installed");

    let err = init_tracing(LogFormat::Json, Some("info")).unwrap_err();
    assert!(matches!(err, LogError::AlreadyInitialized(_)));
}
