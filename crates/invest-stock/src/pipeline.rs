//! The investment analysis pipeline
//!
//! Wires the five stages into a fixed graph: quantitative analysis and market
//! research in parallel, then risk assessment, report writing and compliance
//! validation in order. A complete run is scored from the raw data in state.

use crate::config::StockConfig;
use crate::error::Result;
use crate::keys;
use crate::prompts::PromptLibrary;
use crate::providers::{MarketDataProvider, MarketDataService, NewsProvider, NewsService};
use crate::scoring::{self, ScoreResult};
use crate::stages::{
    self, ComplianceValidationStage, MarketResearchStage, QuantitativeAnalysisStage, ReportWritingStage,
    RiskAssessmentStage,
};
use invest_core::{AnalysisState, StateSnapshot};
use invest_llm::TextGenerator;
use invest_workflow::{
    ConfigurationError, Pipeline, PipelineConfig, RunPhase, RunStatus, StageFailure, StageGraph,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Format of the `current_date` seed, e.g. "January 02, 2026"
pub const DATE_FORMAT: &str = "%B %d, %Y";

/// The subject of one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectConfig {
    /// Upper-cased, trimmed ticker symbol
    pub ticker: String,

    /// Company name; resolved from market data when absent
    pub company_name: Option<String>,

    /// Report date; today when absent
    pub current_date: Option<String>,
}

impl SubjectConfig {
    pub fn new(ticker: impl AsRef<str>) -> Self {
        Self {
            ticker: ticker.as_ref().trim().to_uppercase(),
            company_name: None,
            current_date: None,
        }
    }

    pub fn with_company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = Some(name.into()).filter(|n: &String| !n.trim().is_empty());
        self
    }

    pub fn with_current_date(mut self, date: impl Into<String>) -> Self {
        self.current_date = Some(date.into());
        self
    }
}

/// Result of [`InvestmentPipeline::run_analysis`]
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub run_id: Uuid,
    pub status: RunStatus,
    /// Subject with company name and date filled in
    pub subject: SubjectConfig,
    /// Read-only state at the end of the run
    pub final_state: StateSnapshot,
    /// Present only for complete runs
    pub score: Option<ScoreResult>,
    pub failures: Vec<StageFailure>,
    pub phases: Vec<RunPhase>,
}

impl AnalysisOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Complete
    }

    pub fn failed_stages(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.stage.as_str()).collect()
    }

    pub fn failed_stage(&self) -> Option<&str> {
        self.failures.first().map(|f| f.stage.as_str())
    }

    /// Compliance-validated report text, if the run got that far
    pub fn final_report(&self) -> Option<&str> {
        self.final_state.get_str(keys::FINAL_REPORT)
    }
}

/// Build the fixed investment stage graph
pub fn investment_graph(
    market: Arc<dyn MarketDataProvider>,
    news: Arc<dyn NewsProvider>,
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptLibrary>,
) -> std::result::Result<StageGraph, ConfigurationError> {
    StageGraph::builder()
        .seed_keys(keys::SEED_KEYS)
        .parallel(Arc::new(QuantitativeAnalysisStage::new(
            market,
            generator.clone(),
            prompts.clone(),
        )))
        .parallel(Arc::new(MarketResearchStage::new(
            news,
            generator.clone(),
            prompts.clone(),
        )))
        .then(Arc::new(RiskAssessmentStage::new(
            generator.clone(),
            prompts.clone(),
        )))
        .then(Arc::new(ReportWritingStage::new(
            generator.clone(),
            prompts.clone(),
        )))
        .then(Arc::new(ComplianceValidationStage::new(generator, prompts)))
        .build()
}

/// Runs the investment analysis for one subject at a time
pub struct InvestmentPipeline {
    pipeline: Pipeline,
    market: Arc<dyn MarketDataProvider>,
}

impl InvestmentPipeline {
    /// Assemble the pipeline over the given collaborators
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        news: Arc<dyn NewsProvider>,
        generator: Arc<dyn TextGenerator>,
        config: PipelineConfig,
    ) -> Result<Self> {
        let prompts = Arc::new(PromptLibrary::new()?);
        let graph = investment_graph(market.clone(), news, generator, prompts)?;
        let pipeline = Pipeline::new(graph, config)?;
        Ok(Self { pipeline, market })
    }

    /// Assemble the pipeline over the live Yahoo Finance, Alpha Vantage and
    /// NewsAPI services
    pub fn from_config(
        config: &StockConfig,
        generator: Arc<dyn TextGenerator>,
        pipeline_config: PipelineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Self::new(
            Arc::new(MarketDataService::new(config)),
            Arc::new(NewsService::new(config)),
            generator,
            pipeline_config,
        )
    }

    /// Topology summary, e.g. `[a + b] -> c`
    pub fn describe(&self) -> String {
        self.pipeline.graph().describe()
    }

    /// Topology of the investment graph without building any collaborator
    pub fn topology() -> String {
        format!(
            "[{} + {}] -> {} -> {} -> {}",
            stages::QUANTITATIVE_ANALYSIS,
            stages::MARKET_RESEARCH,
            stages::RISK_ASSESSMENT,
            stages::REPORT_WRITING,
            stages::COMPLIANCE_VALIDATION
        )
    }

    /// Company name from market data, falling back to the ticker
    pub async fn resolve_company_name(&self, ticker: &str) -> String {
        match self.market.get_snapshot(ticker).await {
            Ok(record) => match record.company_name {
                Some(name) if !name.trim().is_empty() => name,
                _ => ticker.to_string(),
            },
            Err(e) => {
                warn!(ticker, error = %e, "Could not resolve company name, using ticker");
                ticker.to_string()
            }
        }
    }

    /// Run every stage for `subject` and score a complete run
    #[instrument(skip(self, subject), fields(ticker = %subject.ticker))]
    pub async fn run_analysis(&self, subject: SubjectConfig) -> AnalysisOutcome {
        let company_name = match subject.company_name.clone() {
            Some(name) => name,
            None => self.resolve_company_name(&subject.ticker).await,
        };
        let current_date = subject
            .current_date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format(DATE_FORMAT).to_string());

        let subject = SubjectConfig {
            ticker: subject.ticker,
            company_name: Some(company_name),
            current_date: Some(current_date),
        };

        let state = seed_state(&subject);
        let run_id = Uuid::new_v4();
        info!(%run_id, company = ?subject.company_name, "Starting investment analysis");

        let outcome = self.pipeline.run_with_id(run_id, state).await;

        let score = if outcome.is_complete() {
            let score = scoring::score_snapshot(&outcome.state);
            info!(
                total = score.total,
                recommendation = %score.recommendation,
                degraded = score.degraded.len(),
                "Investment score calculated"
            );
            Some(score)
        } else {
            None
        };

        AnalysisOutcome {
            run_id,
            status: outcome.status,
            subject,
            final_state: outcome.state,
            score,
            failures: outcome.failures,
            phases: outcome.phases,
        }
    }
}

fn seed_state(subject: &SubjectConfig) -> AnalysisState {
    let text = |value: &Option<String>| value.clone().map(Value::String).unwrap_or(Value::Null);

    AnalysisState::new()
        .with(keys::TICKER, Value::String(subject.ticker.clone()))
        .with(keys::COMPANY_NAME, text(&subject.company_name))
        .with(keys::CURRENT_DATE, text(&subject.current_date))
}
