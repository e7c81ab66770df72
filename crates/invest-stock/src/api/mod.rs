//! API clients for market data and news providers

pub mod alpha_vantage;
pub mod newsapi;
pub mod yahoo;

pub use alpha_vantage::{AlphaVantageClient, CompanyOverview};
pub use newsapi::{NewsApiClient, RawArticle};
pub use yahoo::{Quote, YahooFinanceClient};
