//! Market-data and news providers consumed by the gathering stages
//!
//! Stages depend on the [`MarketDataProvider`] and [`NewsProvider`] traits;
//! [`MarketDataService`] and [`NewsService`] implement them over Yahoo Finance,
//! Alpha Vantage and NewsAPI.

use crate::api::alpha_vantage::{AlphaVantageClient, CompanyOverview};
use crate::api::newsapi::{NewsApiClient, RawArticle};
use crate::api::yahoo::YahooFinanceClient;
use crate::config::StockConfig;
use crate::error::{Result, StockError};
use crate::indicators::{self, PriceStats};
use crate::records::{
    FinancialRecord, MarketHeadline, MarketNewsRecord, NewsArticle, NewsRecord, TechnicalRecord,
    timestamp_now,
};
use crate::sentiment;
use async_trait::async_trait;
use chrono::{Duration, Local};
use tracing::{info, instrument, warn};

/// Source of price snapshots, fundamentals and technical indicators
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Current market snapshot with whatever fundamentals are available
    async fn get_snapshot(&self, symbol: &str) -> Result<FinancialRecord>;

    /// Moving averages and RSI over recent daily closes
    async fn get_technicals(&self, symbol: &str) -> Result<TechnicalRecord>;
}

/// Number of market headlines fetched alongside company news
pub const MARKET_HEADLINES: u32 = 5;

/// Source of recent company news with sentiment
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn get_company_news(&self, company_name: &str, symbol: &str) -> Result<NewsRecord>;

    /// Top headlines for a category and country, e.g. `business` / `us`
    async fn get_market_news(&self, category: &str, country: &str) -> Result<MarketNewsRecord>;
}

/// Yahoo Finance prices, optionally enriched with Alpha Vantage fundamentals
#[derive(Debug, Clone)]
pub struct MarketDataService {
    yahoo: YahooFinanceClient,
    alpha_vantage: Option<AlphaVantageClient>,
    snapshot_range: String,
    technical_range: String,
}

impl MarketDataService {
    pub fn new(config: &StockConfig) -> Self {
        let alpha_vantage = config.alpha_vantage_api_key.as_ref().map(|key| {
            AlphaVantageClient::with_timeout(
                key.clone(),
                config.alpha_vantage_rate_limit,
                config.request_timeout,
            )
        });

        if alpha_vantage.is_none() {
            warn!("ALPHA_VANTAGE_API_KEY not set; snapshots will carry no fundamentals");
        }

        Self {
            yahoo: YahooFinanceClient::new(),
            alpha_vantage,
            snapshot_range: config.snapshot_range.clone(),
            technical_range: config.technical_range.clone(),
        }
    }

    /// Fundamentals are best-effort; a failure only drops them from the snapshot
    async fn fundamentals(&self, symbol: &str) -> Option<CompanyOverview> {
        let client = self.alpha_vantage.as_ref()?;
        match client.get_company_overview(symbol).await {
            Ok(overview) => Some(overview),
            Err(e) => {
                warn!(symbol, error = %e, "Fundamentals unavailable");
                None
            }
        }
    }
}

#[async_trait]
impl MarketDataProvider for MarketDataService {
    #[instrument(skip(self))]
    async fn get_snapshot(&self, symbol: &str) -> Result<FinancialRecord> {
        let history = self
            .yahoo
            .get_historical_range(symbol, &self.snapshot_range)
            .await?;

        let stats = indicators::price_stats(&history).ok_or_else(|| StockError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: "No data found for ticker".to_string(),
        })?;

        let overview = self.fundamentals(symbol).await;
        let record = build_financial_record(symbol, &stats, overview.as_ref());

        info!(symbol, price = stats.current_price, "Retrieved market snapshot");
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn get_technicals(&self, symbol: &str) -> Result<TechnicalRecord> {
        let history = self
            .yahoo
            .get_historical_range(symbol, &self.technical_range)
            .await?;

        let record = indicators::technical_record(symbol, &history)?;
        info!(symbol, rsi_signal = %record.rsi_signal, "Calculated technical indicators");
        Ok(record)
    }
}

/// NewsAPI-backed news with keyword sentiment
#[derive(Debug, Clone)]
pub struct NewsService {
    client: Option<NewsApiClient>,
    lookback_days: u32,
    page_size: u32,
}

impl NewsService {
    pub fn new(config: &StockConfig) -> Self {
        let client = config.news_api_key.as_ref().map(|key| {
            NewsApiClient::new(key.clone(), config.news_rate_limit, config.request_timeout)
        });

        if client.is_none() {
            warn!("NEWS_API_KEY not set; market research will fail");
        }

        Self {
            client,
            lookback_days: config.news_lookback_days,
            page_size: config.news_page_size,
        }
    }
}

#[async_trait]
impl NewsProvider for NewsService {
    #[instrument(skip(self))]
    async fn get_company_news(&self, company_name: &str, symbol: &str) -> Result<NewsRecord> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| StockError::ConfigError("NEWS_API_KEY not configured".to_string()))?;

        let to = Local::now().date_naive();
        let from = to - Duration::days(i64::from(self.lookback_days));
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();

        let query = format!("\"{company_name}\" OR \"{symbol}\"");
        let articles = client
            .get_everything(&query, &from, &to, self.page_size)
            .await?;

        let record = build_news_record(company_name, symbol, &format!("{from} to {to}"), articles);
        info!(
            symbol,
            articles = record.total_articles,
            sentiment = %record.overall_sentiment.sentiment,
            "Retrieved company news"
        );
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn get_market_news(&self, category: &str, country: &str) -> Result<MarketNewsRecord> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| StockError::ConfigError("NEWS_API_KEY not configured".to_string()))?;

        let articles = client
            .get_top_headlines(category, country, MARKET_HEADLINES)
            .await?;

        let record = build_market_news_record(category, country, articles);
        info!(category, country, articles = record.total_articles, "Retrieved market headlines");
        Ok(record)
    }
}

/// Combine price statistics with optional fundamentals
pub fn build_financial_record(
    symbol: &str,
    stats: &PriceStats,
    overview: Option<&CompanyOverview>,
) -> FinancialRecord {
    FinancialRecord {
        ticker: symbol.to_string(),
        company_name: overview.and_then(|o| o.display_name()).map(str::to_string),
        sector: clean_text(overview.and_then(|o| o.sector.as_deref())),
        industry: clean_text(overview.and_then(|o| o.industry.as_deref())),
        current_price: Some(stats.current_price),
        price_change: stats.price_change,
        price_change_percent: stats.price_change_percent,
        market_cap: overview.and_then(CompanyOverview::market_cap),
        pe_ratio: overview.and_then(CompanyOverview::pe_ratio),
        eps: overview.and_then(CompanyOverview::eps),
        dividend_yield: overview.and_then(CompanyOverview::dividend_yield),
        week_52_high: Some(stats.week_52_high),
        week_52_low: Some(stats.week_52_low),
        volume: Some(stats.volume),
        avg_volume: Some(stats.avg_volume),
        beta: overview.and_then(CompanyOverview::beta),
        revenue: overview.and_then(CompanyOverview::revenue),
        profit_margin: overview.and_then(CompanyOverview::profit_margin),
        data_retrieved_at: timestamp_now(),
    }
}

fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "None")
        .map(str::to_string)
}

fn headline(article: RawArticle) -> MarketHeadline {
    MarketHeadline {
        title: article.title.unwrap_or_else(|| "No Title".to_string()),
        description: article
            .description
            .unwrap_or_else(|| "No Description".to_string()),
        source: article.source.name.unwrap_or_else(|| "Unknown".to_string()),
        published_at: article.published_at.unwrap_or_default(),
        url: article.url.unwrap_or_default(),
    }
}

pub fn build_market_news_record(category: &str, country: &str, raw: Vec<RawArticle>) -> MarketNewsRecord {
    let articles: Vec<MarketHeadline> = raw.into_iter().map(headline).collect();
    MarketNewsRecord {
        category: category.to_string(),
        country: country.to_string(),
        total_articles: articles.len(),
        articles,
        retrieved_at: timestamp_now(),
    }
}

/// Attach keyword sentiment to raw articles and aggregate it
pub fn build_news_record(
    company_name: &str,
    symbol: &str,
    date_range: &str,
    raw: Vec<RawArticle>,
) -> NewsRecord {
    let articles: Vec<NewsArticle> = raw
        .into_iter()
        .map(|article| {
            let MarketHeadline {
                title,
                description,
                source,
                published_at,
                url,
            } = headline(article);
            let sentiment = sentiment::analyze_text(&format!("{title} {description}"));

            NewsArticle {
                title,
                description,
                source,
                published_at,
                url,
                sentiment,
            }
        })
        .collect();

    let scores: Vec<i32> = articles.iter().map(|a| a.sentiment.score).collect();

    NewsRecord {
        company_name: company_name.to_string(),
        ticker: symbol.to_string(),
        total_articles: articles.len(),
        date_range: date_range.to_string(),
        overall_sentiment: sentiment::overall_sentiment(&scores),
        articles,
        retrieved_at: timestamp_now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::newsapi::RawSource;
    use crate::records::{Confidence, SentimentLabel};

    fn stats() -> PriceStats {
        PriceStats {
            current_price: 190.5,
            price_change: -1.25,
            price_change_percent: -0.65,
            week_52_high: 199.62,
            week_52_low: 164.08,
            volume: 48_000_000,
            avg_volume: 55_000_000.0,
        }
    }

    fn article(title: &str, description: Option<&str>) -> RawArticle {
        RawArticle {
            source: RawSource {
                name: Some("Reuters".to_string()),
            },
            title: Some(title.to_string()),
            description: description.map(str::to_string),
            url: Some("https://example.com".to_string()),
            published_at: Some("2026-01-02T10:00:00Z".to_string()),
        }
    }

    #[test]
    fn test_financial_record_without_fundamentals() {
        let record = build_financial_record("AAPL", &stats(), None);

        assert_eq!(record.ticker, "AAPL");
        assert_eq!(record.current_price, Some(190.5));
        assert_eq!(record.price_change, -1.25);
        assert_eq!(record.company_name, None);
        assert_eq!(record.pe_ratio, None);
        assert_eq!(record.profit_margin, None);
    }

    #[test]
    fn test_financial_record_with_fundamentals() {
        let overview = CompanyOverview {
            name: Some("Apple Inc".to_string()),
            sector: Some("TECHNOLOGY".to_string()),
            industry: Some("None".to_string()),
            pe_ratio: Some("29.4".to_string()),
            profit_margin: Some("0.246".to_string()),
            beta: Some("-".to_string()),
            ..CompanyOverview::default()
        };

        let record = build_financial_record("AAPL", &stats(), Some(&overview));

        assert_eq!(record.company_name.as_deref(), Some("Apple Inc"));
        assert_eq!(record.sector.as_deref(), Some("TECHNOLOGY"));
        assert_eq!(record.industry, None);
        assert_eq!(record.pe_ratio, Some(29.4));
        assert_eq!(record.profit_margin, Some(0.246));
        assert_eq!(record.beta, None);
    }

    #[test]
    fn test_news_record() {
        let record = build_news_record(
            "Apple",
            "AAPL",
            "2026-01-01 to 2026-01-08",
            vec![
                article("Apple posts strong growth", Some("Profit beats estimates")),
                article("Apple shares rise", None),
                RawArticle::default(),
            ],
        );

        assert_eq!(record.total_articles, 3);
        assert_eq!(record.articles[0].sentiment.sentiment, SentimentLabel::Positive);
        assert_eq!(record.articles[1].description, "No Description");
        assert_eq!(record.articles[2].title, "No Title");
        assert_eq!(record.articles[2].source, "Unknown");

        // scores 1, 1, 0 -> average 0.67
        assert_eq!(record.overall_sentiment.sentiment, SentimentLabel::Positive);
        assert_eq!(record.overall_sentiment.score, Some(0.67));
        assert_eq!(record.overall_sentiment.confidence, Confidence::High);
    }

    #[test]
    fn test_empty_news_record() {
        let record = build_news_record("Apple", "AAPL", "", Vec::new());
        assert_eq!(record.total_articles, 0);
        assert_eq!(record.overall_sentiment.sentiment, SentimentLabel::Neutral);
        assert_eq!(record.overall_sentiment.confidence, Confidence::Low);
    }

    #[tokio::test]
    async fn test_news_service_without_key() {
        let service = NewsService::new(&StockConfig::default());
        let err = service.get_company_news("Apple", "AAPL").await.unwrap_err();
        assert!(matches!(err, StockError::ConfigError(m) if m.contains("NEWS_API_KEY")));

        let err = service.get_market_news("business", "us").await.unwrap_err();
        assert!(matches!(err, StockError::ConfigError(m) if m.contains("NEWS_API_KEY")));
    }

    #[test]
    fn test_market_news_record() {
        let record = build_market_news_record(
            "business",
            "us",
            vec![article("Stocks rally on rate hopes", Some("Indexes climb")), RawArticle::default()],
        );

        assert_eq!(record.category, "business");
        assert_eq!(record.country, "us");
        assert_eq!(record.total_articles, 2);
        assert_eq!(record.articles[0].source, "Reuters");
        assert_eq!(record.articles[1].title, "No Title");
        assert_eq!(record.articles[1].description, "No Description");
        assert_eq!(record.articles[1].source, "Unknown");
    }
}
