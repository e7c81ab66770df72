//! Error types for stock analysis operations

use invest_core::StageError;
use invest_workflow::ConfigurationError;
use thiserror::Error;

/// Stock analysis specific errors
#[derive(Debug, Error)]
pub enum StockError {
    /// API request failed
    #[error("API error: {0}")]
    ApiError(String),

    /// Invalid stock symbol or query parameter provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable {
        symbol: String,
        reason: String,
    },

    /// Rate limit exceeded for API
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded {
        provider: String,
    },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Alpha Vantage API error
    #[error("Alpha Vantage error: {0}")]
    AlphaVantageError(String),

    /// NewsAPI error
    #[error("NewsAPI error: {0}")]
    NewsApiError(String),

    /// Technical indicator calculation error
    #[error("Technical indicator error: {0}")]
    IndicatorError(String),

    /// Prompt template could not be rendered
    #[error("Prompt error: {0}")]
    PromptError(#[from] minijinja::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The analysis stage graph could not be assembled
    #[error("Pipeline configuration error: {0}")]
    PipelineError(#[from] ConfigurationError),
}

/// Result type alias for stock operations
pub type Result<T> = std::result::Result<T, StockError>;

/// Provider and prompt failures surface as collaborator failures of the stage
impl From<StockError> for StageError {
    fn from(err: StockError) -> Self {
        StageError::Collaborator(err.to_string())
    }
}
