// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

fn env_filter_or_level(default_level: tracing::Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.as_str()))
}

/// Installs the stderr subscriber. `RUST_LOG` wins over `level`; stdout is
/// left to the report.
pub fn init_logging(level: LogLevel) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(env_filter_or_level(level.into()))
        .with_writer(std::io::stderr)
        .try_init();
    if let Err(e) = result {
        tracing::debug!(error = %e, "Logging already initialized");
    }
}
