//! Application configuration for the invest-rs binary

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the application writes its reports and logs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name
    pub app_name: String,
    /// Directory for reports and the log file
    pub output_dir: PathBuf,
    /// Log file name inside `output_dir`
    pub log_file_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "invest-rs".to_string(),
            output_dir: PathBuf::from("outputs"),
            log_file_name: "workflow.log".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `INVEST_OUTPUT_DIR`
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = lookup("INVEST_OUTPUT_DIR").filter(|d| !d.trim().is_empty()) {
            config.output_dir = PathBuf::from(dir.trim());
        }
        config
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Full path of the log file
    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join(&self.log_file_name)
    }
}
