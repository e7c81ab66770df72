//! Shared utilities for invest-rs
//!
//! This crate provides common functionality used across the invest-rs workspace:
//! tracing setup (console plus an optional log file) and application
//! configuration for the binary.

pub mod config;
pub mod logging;

pub use config::AppConfig;
pub use logging::{LogConfig, init_tracing, init_tracing_with};
