// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::Level;
use trackmeta_core::ReaderConfig;

/// Log level for filtering messages.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Report format of the `inspect` command.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per track and per frame
    #[default]
    Text,
    /// One JSON document with every track and frame
    Json,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    #[serde(default)]
    pub level: LogLevel,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Root configuration for tmeta-extract.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub reader: ReaderConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Loads the configuration from defaults, an optional TOML file, and
/// `TMETA_`-prefixed environment variables (`__` separates sections, e.g.
/// `TMETA_READER__REFERENCE_TAG=cdsc`).
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given configuration file does not exist
/// - The configuration file contains invalid TOML syntax
/// - Environment variables are set but contain invalid values
pub fn load(config_path: Option<&Path>) -> Result<Config, Box<figment::Error>> {
    let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

    if let Some(path) = config_path {
        if !path.exists() {
            return Err(Box::new(figment::Error::from(format!(
                "configuration file '{}' not found",
                path.display()
            ))));
        }
        figment = figment.merge(Toml::file(path));
    }

    figment.merge(Env::prefixed("TMETA_").split("__")).extract().map_err(Box::new)
}
