//! Structured logging setup.
//!
//! # Component Targets
//!
//! | Target | Description |
//! |--------|-------------|
//! | `cake_customizer::pricing` | Rule resolution, data gaps, rule cache |
//! | `cake_customizer::reconcile` | Analysis merges and re-syncs |
//! | `cake_customizer::prompt` | Prompt synthesis and free-text policy |
//! | `cake_customizer::providers` | Analysis and render calls |
//!
//! ```bash
//! # Debug pricing only
//! RUST_LOG=warn,cake_customizer::pricing=debug price_sandbox price ...
//! ```

use std::fs::File;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::prelude::Result;
use crate::Error;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON format (best for log aggregation)
    Json,
    /// Compact single-line format
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,

    /// Format for stdout logging
    #[serde(default)]
    pub format: LogFormat,

    /// Optional log file; when set, both streams are JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            log_file: None,
        }
    }
}

impl LogConfig {
    /// Filter from `RUST_LOG`, falling back to the configured level.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }
}

/// Install the global subscriber.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
/// Fails if a subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = config.env_filter();

    let installed = if let Some(path) = &config.log_file {
        let file = File::create(path)?;
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .json();
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .json();
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer)
            .try_init()
    } else {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);
        match config.format {
            LogFormat::Json => builder.json().finish().try_init(),
            LogFormat::Compact => builder.compact().finish().try_init(),
            LogFormat::Pretty => builder.finish().try_init(),
        }
    };
    installed.map_err(|e| Error::Config(format!("logging already initialised: {e}")))
}
