//! Fakes shared by stage and pipeline tests

use crate::records::{
    Confidence, FinancialRecord, MarketHeadline, MarketNewsRecord, NewsRecord, OverallSentiment, SentimentLabel, TechnicalRecord,
};
use async_trait::async_trait;
use invest_llm::{LLMError, TextGenerator};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Text generator that records prompts and answers from a script
pub struct FakeGenerator {
    reply: Option<String>,
    fail_on: Option<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    /// Answers every prompt with `reply` followed by the call number
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            fail_on: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call
    pub fn failing() -> Self {
        Self {
            reply: None,
            fail_on: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fails only prompts containing `marker`
    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_on = Some(marker.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> invest_llm::Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().unwrap().push(prompt.to_string());
        let refused = self
            .fail_on
            .as_ref()
            .is_some_and(|marker| prompt.contains(marker.as_str()));
        match &self.reply {
            Some(_) if refused => Err(LLMError::RequestFailed("refused".to_string())),
            Some(reply) => Ok(format!("{reply} #{n}")),
            None => Err(LLMError::RequestFailed("service unavailable".to_string())),
        }
    }
}

pub fn financial_record(ticker: &str, pe_ratio: Option<f64>, profit_margin: Option<f64>) -> FinancialRecord {
    FinancialRecord {
        ticker: ticker.to_string(),
        company_name: Some("Apple Inc".to_string()),
        sector: Some("TECHNOLOGY".to_string()),
        industry: None,
        current_price: Some(190.0),
        price_change: 1.0,
        price_change_percent: 0.53,
        market_cap: Some(2.9e12),
        pe_ratio,
        eps: Some(6.4),
        dividend_yield: None,
        week_52_high: Some(199.6),
        week_52_low: Some(164.1),
        volume: Some(50_000_000),
        avg_volume: Some(55_000_000.0),
        beta: None,
        revenue: None,
        profit_margin,
        data_retrieved_at: "2026-01-02 10:00:00".to_string(),
    }
}

pub fn technical_record(ticker: &str) -> TechnicalRecord {
    TechnicalRecord {
        ticker: ticker.to_string(),
        current_price: 190.0,
        moving_average_20: Some(185.0),
        moving_average_50: Some(180.0),
        rsi_14: Some(61.0),
        price_vs_ma20: "Above".to_string(),
        price_vs_ma50: "Above".to_string(),
        rsi_signal: "Neutral".to_string(),
        calculated_at: "2026-01-02 10:00:00".to_string(),
    }
}

pub fn news_record(ticker: &str, sentiment: SentimentLabel) -> NewsRecord {
    NewsRecord {
        company_name: "Apple Inc".to_string(),
        ticker: ticker.to_string(),
        total_articles: 0,
        date_range: "2025-12-26 to 2026-01-02".to_string(),
        overall_sentiment: OverallSentiment {
            sentiment,
            score: None,
            confidence: Confidence::Low,
        },
        articles: Vec::new(),
        retrieved_at: "2026-01-02 10:00:00".to_string(),
    }
}

pub fn market_news(headline: &str) -> MarketNewsRecord {
    MarketNewsRecord {
        category: "business".to_string(),
        country: "us".to_string(),
        total_articles: 1,
        articles: vec![MarketHeadline {
            title: headline.to_string(),
            description: "No Description".to_string(),
            source: "Reuters".to_string(),
            published_at: "2026-01-02T09:00:00Z".to_string(),
            url: String::new(),
        }],
        retrieved_at: "2026-01-02 10:00:00".to_string(),
    }
}
