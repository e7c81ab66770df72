//! Logging and tracing utilities

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Tracing setup for a process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is not set
    pub default_filter: String,

    /// Also write plain-text logs here, truncating any previous run's file
    pub log_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            log_file: None,
        }
    }
}

impl LogConfig {
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }
}

/// Initialize tracing subscriber with default configuration
pub fn init_tracing() {
    // A subscriber installed earlier (e.g. by a test harness) wins.
    let _ = init_tracing_with(&LogConfig::default());
}

/// Initialize tracing with a console layer and an optional log file layer
pub fn init_tracing_with(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_filter))
        .with_context(|| format!("invalid log filter `{}`", config.default_filter))?;

    let file_layer = match &config.log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    Ok(())
}

/// Create (or truncate) a log file, creating its parent directory
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    File::create(path).with_context(|| format!("failed to open log file {}", path.display()))
}
