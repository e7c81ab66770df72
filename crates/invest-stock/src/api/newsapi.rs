//! NewsAPI client for company news and market headlines

use crate::error::{Result, StockError};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

const BASE_URL: &str = "https://newsapi.org/v2";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Article source as reported by NewsAPI
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSource {
    pub name: Option<String>,
}

/// Article as returned by the `everything` and `top-headlines` endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    #[serde(default)]
    pub source: RawSource,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<String>,
}

/// Response envelope; errors come back with status "error"
#[derive(Debug, Deserialize)]
struct ArticlesResponse {
    status: String,
    #[serde(default)]
    articles: Vec<RawArticle>,
    code: Option<String>,
    message: Option<String>,
}

/// NewsAPI client with rate limiting
#[derive(Debug, Clone)]
pub struct NewsApiClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl NewsApiClient {
    /// Create a new NewsAPI client
    ///
    /// # Arguments
    /// * `api_key` - NewsAPI key
    /// * `rate_limit` - Requests per minute
    pub fn new(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Point the client at a different host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Search all articles matching `query`, newest first
    ///
    /// # Arguments
    /// * `query` - NewsAPI search expression
    /// * `from` - Start date (YYYY-MM-DD)
    /// * `to` - End date (YYYY-MM-DD)
    /// * `page_size` - Maximum number of articles
    pub async fn get_everything(
        &self,
        query: &str,
        from: &str,
        to: &str,
        page_size: u32,
    ) -> Result<Vec<RawArticle>> {
        let page_size = page_size.to_string();
        let params = [
            ("q", query),
            ("from", from),
            ("to", to),
            ("sortBy", "publishedAt"),
            ("language", "en"),
            ("pageSize", page_size.as_str()),
        ];
        self.fetch_articles("everything", &params).await
    }

    /// Current top headlines for a category and country
    ///
    /// # Arguments
    /// * `category` - NewsAPI category, e.g. `business`
    /// * `country` - Two-letter country code
    /// * `page_size` - Maximum number of articles
    pub async fn get_top_headlines(
        &self,
        category: &str,
        country: &str,
        page_size: u32,
    ) -> Result<Vec<RawArticle>> {
        let page_size = page_size.to_string();
        let params = [
            ("category", category),
            ("country", country),
            ("pageSize", page_size.as_str()),
        ];
        self.fetch_articles("top-headlines", &params).await
    }

    async fn fetch_articles(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Vec<RawArticle>> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(format!("{}/{endpoint}", self.base_url))
            .query(params)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(StockError::RateLimitExceeded {
                provider: "NewsAPI".to_string(),
            });
        }

        let body = response.text().await?;
        let parsed: ArticlesResponse = serde_json::from_str(&body).map_err(|_| {
            StockError::NewsApiError(format!("API request failed with status {status}"))
        })?;

        into_articles(parsed)
    }
}

fn into_articles(response: ArticlesResponse) -> Result<Vec<RawArticle>> {
    if response.status != "ok" {
        if response.code.as_deref() == Some("rateLimited") {
            return Err(StockError::RateLimitExceeded {
                provider: "NewsAPI".to_string(),
            });
        }
        return Err(StockError::NewsApiError(
            response
                .message
                .unwrap_or_else(|| format!("status {}", response.status)),
        ));
    }
    Ok(response.articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<Vec<RawArticle>> {
        into_articles(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_ok_response() {
        let articles = parse(json!({
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {
                    "source": {"id": null, "name": "Reuters"},
                    "title": "Apple beats estimates",
                    "description": "Strong iPhone sales",
                    "url": "https://example.com/a",
                    "publishedAt": "2026-01-02T10:00:00Z"
                },
                {"title": "No source or description"}
            ]
        }))
        .unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].source.name.as_deref(), Some("Reuters"));
        assert_eq!(articles[0].published_at.as_deref(), Some("2026-01-02T10:00:00Z"));
        assert!(articles[1].source.name.is_none());
        assert!(articles[1].description.is_none());
    }

    #[test]
    fn test_error_response() {
        let err = parse(json!({
            "status": "error",
            "code": "apiKeyInvalid",
            "message": "Your API key is invalid"
        }))
        .unwrap_err();
        assert!(matches!(err, StockError::NewsApiError(m) if m.contains("invalid")));

        let err = parse(json!({"status": "error", "code": "rateLimited"})).unwrap_err();
        assert!(matches!(err, StockError::RateLimitExceeded { .. }));
    }

    #[tokio::test]
    #[ignore] // Requires API key and network access
    async fn test_get_everything() {
        let key = std::env::var("NEWS_API_KEY").unwrap();
        let client = NewsApiClient::new(key, 60, Duration::from_secs(30));
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let articles = client
            .get_everything("\"Apple\" OR \"AAPL\"", &today, &today, 5)
            .await
            .unwrap();
        assert!(articles.len() <= 5);
    }

    #[tokio::test]
    #[ignore] // Requires API key and network access
    async fn test_get_top_headlines() {
        let key = std::env::var("NEWS_API_KEY").unwrap();
        let client = NewsApiClient::new(key, 60, Duration::from_secs(30));
        let articles = client.get_top_headlines("business", "us", 5).await.unwrap();
        assert!(articles.len() <= 5);
    }
}
