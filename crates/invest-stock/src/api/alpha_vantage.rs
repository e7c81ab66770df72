//! Alpha Vantage API client

use crate::error::{Result, StockError};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

const BASE_URL: &str = "https://www.alphavantage.co/query";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Alpha Vantage API client
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

/// Company overview and fundamentals
///
/// Alpha Vantage reports every figure as a string and uses "None" or "-" for
/// missing values; see [`parse_metric`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompanyOverview {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_capitalization: Option<String>,
    #[serde(rename = "PERatio")]
    pub pe_ratio: Option<String>,
    #[serde(rename = "EPS")]
    pub eps: Option<String>,
    pub dividend_yield: Option<String>,
    pub beta: Option<String>,
    #[serde(rename = "RevenueTTM")]
    pub revenue_ttm: Option<String>,
    pub profit_margin: Option<String>,
}

impl CompanyOverview {
    pub fn market_cap(&self) -> Option<f64> {
        parse_metric(self.market_capitalization.as_deref())
    }

    pub fn pe_ratio(&self) -> Option<f64> {
        parse_metric(self.pe_ratio.as_deref())
    }

    pub fn eps(&self) -> Option<f64> {
        parse_metric(self.eps.as_deref())
    }

    pub fn dividend_yield(&self) -> Option<f64> {
        parse_metric(self.dividend_yield.as_deref())
    }

    pub fn beta(&self) -> Option<f64> {
        parse_metric(self.beta.as_deref())
    }

    pub fn revenue(&self) -> Option<f64> {
        parse_metric(self.revenue_ttm.as_deref())
    }

    pub fn profit_margin(&self) -> Option<f64> {
        parse_metric(self.profit_margin.as_deref())
    }

    /// Company name, ignoring blank values
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Parse a numeric Alpha Vantage field
pub fn parse_metric(raw: Option<&str>) -> Option<f64> {
    match raw.map(str::trim) {
        None | Some("") | Some("None") | Some("-") => None,
        Some(text) => text.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

/// Reject error, throttling and empty payloads
pub fn check_response(symbol: &str, data: &Value) -> Result<()> {
    if let Some(error) = data.get("Error Message") {
        return Err(StockError::AlphaVantageError(error.to_string()));
    }

    if data.get("Note").is_some() || data.get("Information").is_some() {
        return Err(StockError::RateLimitExceeded {
            provider: "Alpha Vantage".to_string(),
        });
    }

    if data.as_object().is_none_or(|o| o.is_empty()) {
        return Err(StockError::InvalidSymbol(symbol.to_string()));
    }

    Ok(())
}

impl AlphaVantageClient {
    /// Create a new Alpha Vantage client with API key and rate limit
    ///
    /// # Arguments
    /// * `api_key` - Alpha Vantage API key
    /// * `rate_limit` - Maximum requests per minute (5 on the free tier)
    pub fn new(api_key: impl Into<String>, rate_limit: u32) -> Self {
        Self::with_timeout(api_key, rate_limit, Duration::from_secs(30))
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: api_key.into(),
            rate_limiter,
        }
    }

    /// Get company overview and fundamental data
    pub async fn get_company_overview(&self, symbol: &str) -> Result<CompanyOverview> {
        self.rate_limiter.until_ready().await;

        let params = [
            ("function", "OVERVIEW"),
            ("symbol", symbol),
            ("apikey", self.api_key.as_str()),
        ];

        let response = self.client.get(BASE_URL).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(StockError::AlphaVantageError(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let data: Value = response.json().await?;
        check_response(symbol, &data)?;

        let overview: CompanyOverview = serde_json::from_value(data)?;
        Ok(overview)
    }
}
