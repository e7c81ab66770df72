use super::{REPORT_WRITING, require_all, write_text};
use crate::keys;
use crate::prompts::{PromptLibrary, ReportInputs};
use async_trait::async_trait;
use invest_core::{AnalysisState, Stage, StageError};
use invest_llm::TextGenerator;
use std::sync::Arc;
use tracing::info;

/// Synthesizes the three narratives into a draft Markdown report
pub struct ReportWritingStage {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptLibrary>,
}

impl ReportWritingStage {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Arc<PromptLibrary>) -> Self {
        Self { generator, prompts }
    }
}

#[async_trait]
impl Stage for ReportWritingStage {
    fn name(&self) -> &str {
        REPORT_WRITING
    }

    fn inputs(&self) -> &[&'static str] {
        &[
            keys::QUANTITATIVE_ANALYSIS,
            keys::MARKET_SENTIMENT_ANALYSIS,
            keys::RISK_ASSESSMENT,
            keys::CURRENT_DATE,
            keys::COMPANY_NAME,
            keys::TICKER,
        ]
    }

    fn outputs(&self) -> &[&'static str] {
        &[keys::DRAFT_REPORT]
    }

    async fn execute(&self, state: &mut AnalysisState) -> Result<(), StageError> {
        let [
            quantitative_analysis,
            market_sentiment_analysis,
            risk_assessment,
            current_date,
            company_name,
            ticker,
        ] = require_all(state, [
            keys::QUANTITATIVE_ANALYSIS,
            keys::MARKET_SENTIMENT_ANALYSIS,
            keys::RISK_ASSESSMENT,
            keys::CURRENT_DATE,
            keys::COMPANY_NAME,
            keys::TICKER,
        ])?;

        let prompt = self.prompts.report_writing(&ReportInputs {
            company_name,
            ticker,
            current_date,
            quantitative_analysis,
            market_sentiment_analysis,
            risk_assessment,
        })?;
        let draft = self.generator.generate(&prompt).await?;
        write_text(state, keys::DRAFT_REPORT, draft);

        info!("Draft report generated");
        Ok(())
    }
}
