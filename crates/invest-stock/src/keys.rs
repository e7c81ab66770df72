//! Analysis state keys
//!
//! Seeds are written by the caller before the run; every other key has exactly
//! one producing stage.

pub const TICKER: &str = "ticker";
pub const COMPANY_NAME: &str = "company_name";
pub const CURRENT_DATE: &str = "current_date";

/// Keys the caller seeds before a run
pub const SEED_KEYS: [&str; 3] = [TICKER, COMPANY_NAME, CURRENT_DATE];

pub const RAW_FINANCIAL_DATA: &str = "raw_financial_data";
pub const RAW_TECHNICAL_DATA: &str = "raw_technical_data";
pub const RAW_NEWS_DATA: &str = "raw_news_data";

pub const QUANTITATIVE_ANALYSIS: &str = "quantitative_analysis";
pub const MARKET_SENTIMENT_ANALYSIS: &str = "market_sentiment_analysis";
pub const RISK_ASSESSMENT: &str = "risk_assessment";
pub const DRAFT_REPORT: &str = "draft_report";
pub const FINAL_REPORT: &str = "final_report";

/// Textual outputs of the five synthesis stages, in pipeline order
pub const SYNTHESIS_OUTPUTS: [&str; 5] = [
    QUANTITATIVE_ANALYSIS,
    MARKET_SENTIMENT_ANALYSIS,
    RISK_ASSESSMENT,
    DRAFT_REPORT,
    FINAL_REPORT,
];
