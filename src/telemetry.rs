//! Logging setup.
//!
//! Everything goes to stderr, filtered by `RUST_LOG` (default `info`). When
//! logging is enabled in the config, events are also appended to the log
//! file without ANSI colors.

use crate::config::LoggingConfig;
use crate::error::{DealyzeError, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber. Fails if one is already installed or the
/// log file cannot be opened.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let file_layer = if config.enabled {
        let file = open_log_file(&config.log_file)?;
        Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(EnvFilter::new("info")),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| DealyzeError::Logging(e.to_string()))
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}
