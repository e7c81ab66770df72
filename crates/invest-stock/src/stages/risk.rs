use super::{RISK_ASSESSMENT, require_all, write_text};
use crate::keys;
use crate::prompts::PromptLibrary;
use async_trait::async_trait;
use invest_core::{AnalysisState, Stage, StageError};
use invest_llm::TextGenerator;
use std::sync::Arc;
use tracing::info;

/// Combines the quantitative and sentiment narratives into a risk assessment
pub struct RiskAssessmentStage {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptLibrary>,
}

impl RiskAssessmentStage {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Arc<PromptLibrary>) -> Self {
        Self { generator, prompts }
    }
}

#[async_trait]
impl Stage for RiskAssessmentStage {
    fn name(&self) -> &str {
        RISK_ASSESSMENT
    }

    fn inputs(&self) -> &[&'static str] {
        &[keys::QUANTITATIVE_ANALYSIS, keys::MARKET_SENTIMENT_ANALYSIS]
    }

    fn outputs(&self) -> &[&'static str] {
        &[keys::RISK_ASSESSMENT]
    }

    async fn execute(&self, state: &mut AnalysisState) -> Result<(), StageError> {
        let [quantitative, sentiment] = require_all(
            state,
            [keys::QUANTITATIVE_ANALYSIS, keys::MARKET_SENTIMENT_ANALYSIS],
        )?;

        let prompt = self.prompts.risk_assessment(quantitative, sentiment)?;
        let assessment = self.generator.generate(&prompt).await?;
        write_text(state, keys::RISK_ASSESSMENT, assessment);

        info!("Risk assessment completed");
        Ok(())
    }
}
