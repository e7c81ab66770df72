//! Typed records exchanged with the market-data and news providers
//!
//! These are written into the analysis state as JSON and embedded verbatim in
//! prompts, so field names follow the keys the scoring engine reads
//! (`pe_ratio`, `profit_margin`, `overall_sentiment.sentiment`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Market snapshot and fundamentals for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub ticker: String,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub current_price: Option<f64>,
    pub price_change: f64,
    pub price_change_percent: f64,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
    pub dividend_yield: Option<f64>,
    #[serde(rename = "52_week_high")]
    pub week_52_high: Option<f64>,
    #[serde(rename = "52_week_low")]
    pub week_52_low: Option<f64>,
    pub volume: Option<u64>,
    pub avg_volume: Option<f64>,
    pub beta: Option<f64>,
    pub revenue: Option<f64>,
    pub profit_margin: Option<f64>,
    pub data_retrieved_at: String,
}

/// Technical indicators over recent daily closes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalRecord {
    pub ticker: String,
    pub current_price: f64,
    pub moving_average_20: Option<f64>,
    pub moving_average_50: Option<f64>,
    pub rsi_14: Option<f64>,
    pub price_vs_ma20: String,
    pub price_vs_ma50: String,
    pub rsi_signal: String,
    pub calculated_at: String,
}

/// Categorical sentiment label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentLabel::Positive => f.write_str("Positive"),
            SentimentLabel::Neutral => f.write_str("Neutral"),
            SentimentLabel::Negative => f.write_str("Negative"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Keyword sentiment of a single article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSentiment {
    pub sentiment: SentimentLabel,
    pub score: i32,
    pub positive_indicators: usize,
    pub negative_indicators: usize,
}

/// Aggregate sentiment across all fetched articles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallSentiment {
    pub sentiment: SentimentLabel,
    /// Average article score; absent when there were no articles
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub score: Option<f64>,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub description: String,
    pub source: String,
    pub published_at: String,
    pub url: String,
    pub sentiment: ArticleSentiment,
}

/// Recent company news with keyword sentiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsRecord {
    pub company_name: String,
    pub ticker: String,
    pub total_articles: usize,
    pub date_range: String,
    pub overall_sentiment: OverallSentiment,
    pub articles: Vec<NewsArticle>,
    pub retrieved_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketHeadline {
    pub title: String,
    pub description: String,
    pub source: String,
    pub published_at: String,
    pub url: String,
}

/// Broad market headlines used as context for company news
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketNewsRecord {
    pub category: String,
    pub country: String,
    pub total_articles: usize,
    pub articles: Vec<MarketHeadline>,
    pub retrieved_at: String,
}

/// Local timestamp in the format stamped on every record
pub(crate) fn timestamp_now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_financial_record_keys() {
        let record = FinancialRecord {
            ticker: "AAPL".to_string(),
            company_name: Some("Apple Inc".to_string()),
            sector: None,
            industry: None,
            current_price: Some(190.12),
            price_change: 1.5,
            price_change_percent: 0.79,
            market_cap: None,
            pe_ratio: Some(29.4),
            eps: None,
            dividend_yield: None,
            week_52_high: Some(199.62),
            week_52_low: Some(164.08),
            volume: Some(51_000_000),
            avg_volume: None,
            beta: None,
            revenue: None,
            profit_margin: None,
            data_retrieved_at: "2026-01-02 10:00:00".to_string(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["pe_ratio"], json!(29.4));
        assert_eq!(value["profit_margin"], json!(null));
        assert_eq!(value["52_week_high"], json!(199.62));
    }

    #[test]
    fn test_overall_sentiment_shape() {
        let news = json!({
            "sentiment": "Positive",
            "score": 0.6,
            "confidence": "High"
        });
        let overall: OverallSentiment = serde_json::from_value(news).unwrap();
        assert_eq!(overall.sentiment, SentimentLabel::Positive);
        assert_eq!(overall.confidence, Confidence::High);

        let empty = OverallSentiment {
            sentiment: SentimentLabel::Neutral,
            score: None,
            confidence: Confidence::Low,
        };
        assert_eq!(
            serde_json::to_value(&empty).unwrap(),
            json!({"sentiment": "Neutral", "confidence": "Low"})
        );
    }
}
