//! Yahoo Finance API client

use crate::error::{Result, StockError};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api as yahoo;

/// Range names accepted by [`YahooFinanceClient::get_historical_range`]
pub const VALID_RANGES: [&str; 11] = [
    "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
];

/// Yahoo Finance API client
#[derive(Debug, Clone, Default)]
pub struct YahooFinanceClient {}

/// One daily price bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adjclose: f64,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new() -> Self {
        Self {}
    }

    /// Get historical quotes for a symbol between two instants
    pub async fn get_historical_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Quote>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| StockError::YahooFinanceError(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| StockError::YahooFinanceError(format!("Invalid end timestamp: {e}")))?;

        let response = provider
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        debug!(symbol, bars = quotes.len(), "Fetched price history");

        Ok(quotes
            .iter()
            .map(|q| Quote {
                symbol: symbol.to_string(),
                timestamp: DateTime::from_timestamp(q.timestamp as i64, 0)
                    .unwrap_or_else(Utc::now),
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                volume: q.volume,
                adjclose: q.adjclose,
            })
            .collect())
    }

    /// Get historical quotes for a named range ending now
    pub async fn get_historical_range(&self, symbol: &str, range: &str) -> Result<Vec<Quote>> {
        let end = Utc::now();
        let start = range_start(range, end)?;
        self.get_historical_quotes(symbol, start, end).await
    }
}

/// Start of a named range ending at `end`
pub fn range_start(range: &str, end: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let days = match range {
        "1d" => 1,
        "5d" => 5,
        "1mo" => 30,
        "3mo" => 90,
        "6mo" => 180,
        "1y" => 365,
        "2y" => 730,
        "5y" => 1825,
        "10y" => 3650,
        "max" => 36500,
        "ytd" => {
            return NaiveDate::from_ymd_opt(end.year(), 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
                .ok_or_else(|| StockError::InvalidSymbol(format!("Invalid range: {range}")));
        }
        _ => return Err(StockError::InvalidSymbol(format!("Invalid range: {range}"))),
    };
    Ok(end - Duration::days(days))
}
