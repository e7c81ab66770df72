//! Configuration for stock analysis operations

use crate::api::yahoo::VALID_RANGES;
use crate::error::{Result, StockError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for stock analysis operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockConfig {
    /// Model used by every synthesis stage
    pub model: String,

    /// Sampling temperature for generation
    pub temperature: f32,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Alpha Vantage API key; fundamentals are omitted without it
    pub alpha_vantage_api_key: Option<String>,

    /// Alpha Vantage requests per minute
    pub alpha_vantage_rate_limit: u32,

    /// NewsAPI key; the news stage fails without it
    pub news_api_key: Option<String>,

    /// NewsAPI requests per minute
    pub news_rate_limit: u32,

    /// How many days of news to fetch
    pub news_lookback_days: u32,

    /// Maximum number of articles per request
    pub news_page_size: u32,

    /// History range used for the price snapshot
    pub snapshot_range: String,

    /// History range used for technical indicators
    pub technical_range: String,

    /// Request timeout duration
    pub request_timeout: Duration,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.1,
            max_tokens: 4096,
            alpha_vantage_api_key: None,
            alpha_vantage_rate_limit: 5,
            news_api_key: None,
            news_rate_limit: 60,
            news_lookback_days: 7,
            news_page_size: 10,
            snapshot_range: "1y".to_string(),
            technical_range: "3mo".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl StockConfig {
    /// Create a new configuration builder
    pub fn builder() -> StockConfigBuilder {
        StockConfigBuilder::default()
    }

    /// Load configuration from environment variables
    ///
    /// Reads `ALPHA_VANTAGE_API_KEY`, `NEWS_API_KEY`, `LLM_MODEL`,
    /// `LLM_TEMPERATURE` and `NEWS_LOOKBACK_DAYS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut config = Self::default();

        config.alpha_vantage_api_key = var("ALPHA_VANTAGE_API_KEY");
        config.news_api_key = var("NEWS_API_KEY");

        if let Some(model) = var("LLM_MODEL") {
            config.model = model;
        }

        if let Some(raw) = var("LLM_TEMPERATURE") {
            config.temperature = raw.parse().map_err(|_| {
                StockError::ConfigError(format!("LLM_TEMPERATURE is not a number: {raw}"))
            })?;
        }

        if let Some(raw) = var("NEWS_LOOKBACK_DAYS") {
            config.news_lookback_days = raw.parse().map_err(|_| {
                StockError::ConfigError(format!("NEWS_LOOKBACK_DAYS is not a whole number: {raw}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(StockError::ConfigError("model must not be empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(StockError::ConfigError(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }

        if self.max_tokens == 0 {
            return Err(StockError::ConfigError(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.news_lookback_days == 0 {
            return Err(StockError::ConfigError(
                "news_lookback_days must be greater than 0".to_string(),
            ));
        }

        if self.news_page_size == 0 || self.news_page_size > 100 {
            return Err(StockError::ConfigError(format!(
                "news_page_size must be between 1 and 100, got {}",
                self.news_page_size
            )));
        }

        for range in [&self.snapshot_range, &self.technical_range] {
            if !VALID_RANGES.iter().any(|r| *r == range.as_str()) {
                return Err(StockError::ConfigError(format!("unknown history range: {range}")));
            }
        }

        Ok(())
    }
}

/// Builder for StockConfig
#[derive(Debug, Default)]
pub struct StockConfigBuilder {
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
    alpha_vantage_api_key: Option<String>,
    alpha_vantage_rate_limit: Option<u32>,
    news_api_key: Option<String>,
    news_rate_limit: Option<u32>,
    news_lookback_days: Option<u32>,
    news_page_size: Option<u32>,
    snapshot_range: Option<String>,
    technical_range: Option<String>,
    request_timeout: Option<Duration>,
}

impl StockConfigBuilder {
    /// Set the generation model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens per completion
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set Alpha Vantage API key
    pub fn alpha_vantage_api_key(mut self, key: impl Into<String>) -> Self {
        self.alpha_vantage_api_key = Some(key.into());
        self
    }

    pub fn alpha_vantage_rate_limit(mut self, per_minute: u32) -> Self {
        self.alpha_vantage_rate_limit = Some(per_minute);
        self
    }

    /// Set NewsAPI key
    pub fn news_api_key(mut self, key: impl Into<String>) -> Self {
        self.news_api_key = Some(key.into());
        self
    }

    pub fn news_rate_limit(mut self, per_minute: u32) -> Self {
        self.news_rate_limit = Some(per_minute);
        self
    }

    /// Set how many days of news to fetch
    pub fn news_lookback_days(mut self, days: u32) -> Self {
        self.news_lookback_days = Some(days);
        self
    }

    pub fn news_page_size(mut self, size: u32) -> Self {
        self.news_page_size = Some(size);
        self
    }

    /// Set the snapshot history range
    pub fn snapshot_range(mut self, range: impl Into<String>) -> Self {
        self.snapshot_range = Some(range.into());
        self
    }

    /// Set the technical indicator history range
    pub fn technical_range(mut self, range: impl Into<String>) -> Self {
        self.technical_range = Some(range.into());
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<StockConfig> {
        let defaults = StockConfig::default();

        let config = StockConfig {
            model: self.model.unwrap_or(defaults.model),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            alpha_vantage_api_key: self.alpha_vantage_api_key,
            alpha_vantage_rate_limit: self
                .alpha_vantage_rate_limit
                .unwrap_or(defaults.alpha_vantage_rate_limit),
            news_api_key: self.news_api_key,
            news_rate_limit: self.news_rate_limit.unwrap_or(defaults.news_rate_limit),
            news_lookback_days: self.news_lookback_days.unwrap_or(defaults.news_lookback_days),
            news_page_size: self.news_page_size.unwrap_or(defaults.news_page_size),
            snapshot_range: self.snapshot_range.unwrap_or(defaults.snapshot_range),
            technical_range: self.technical_range.unwrap_or(defaults.technical_range),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
        };

        config.validate()?;
        Ok(config)
    }
}
