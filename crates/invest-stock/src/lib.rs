//! Investment analysis domain for invest-rs
//!
//! This crate runs a multi-stage analysis of a single stock ticker on top of
//! the `invest-workflow` pipeline engine. It includes:
//!
//! - Market data from Yahoo Finance, with Alpha Vantage fundamentals
//! - Technical indicators (SMA 20/50, RSI 14)
//! - Company news from NewsAPI with keyword sentiment
//! - Five analysis stages backed by a text-generation service
//! - Deterministic scoring of valuation, profitability and sentiment
//!
//! # Architecture
//!
//! [`InvestmentPipeline`] runs a fixed stage graph:
//! - `quantitative_analysis` and `market_research` gather data in parallel
//! - `risk_assessment`, `report_writing` and `compliance_validation` follow in order
//!
//! A complete run is scored with [`scoring::score_snapshot`] and rendered with
//! [`render_report`].
//!
//! # Example
//!
//! ```rust,ignore
//! use invest_llm::{CompletionGenerator, GeneratorConfig, providers::OpenAIProvider};
//! use invest_stock::{InvestmentPipeline, StockConfig, SubjectConfig, render_report};
//! use invest_workflow::PipelineConfig;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = StockConfig::from_env()?;
//!     let provider = Arc::new(OpenAIProvider::from_env()?);
//!     let generator = Arc::new(CompletionGenerator::new(provider, GeneratorConfig::default()));
//!
//!     let pipeline = InvestmentPipeline::from_config(&config, generator, PipelineConfig::default())?;
//!     let outcome = pipeline.run_analysis(SubjectConfig::new("NVDA")).await;
//!
//!     if let Some(report) = render_report(&outcome) {
//!         println!("{report}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod indicators;
pub mod keys;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod records;
pub mod report;
pub mod scoring;
pub mod sentiment;
pub mod stages;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use config::StockConfig;
pub use error::{Result, StockError};
pub use pipeline::{AnalysisOutcome, InvestmentPipeline, SubjectConfig};
pub use providers::{MarketDataProvider, MarketDataService, NewsProvider, NewsService};
pub use records::{FinancialRecord, MarketNewsRecord, NewsRecord, TechnicalRecord};
pub use report::{render_report, report_file_name};
pub use scoring::{Recommendation, ScoreResult};
