use super::{COMPLIANCE_VALIDATION, write_text};
use crate::keys;
use crate::prompts::PromptLibrary;
use async_trait::async_trait;
use invest_core::{AnalysisState, Stage, StageError};
use invest_llm::TextGenerator;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Fact-checks the draft against raw financial data and adds compliance text
pub struct ComplianceValidationStage {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptLibrary>,
}

impl ComplianceValidationStage {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Arc<PromptLibrary>) -> Self {
        Self { generator, prompts }
    }
}

#[async_trait]
impl Stage for ComplianceValidationStage {
    fn name(&self) -> &str {
        COMPLIANCE_VALIDATION
    }

    fn inputs(&self) -> &[&'static str] {
        &[keys::DRAFT_REPORT, keys::RAW_FINANCIAL_DATA]
    }

    fn outputs(&self) -> &[&'static str] {
        &[keys::FINAL_REPORT]
    }

    async fn execute(&self, state: &mut AnalysisState) -> Result<(), StageError> {
        let draft = state.require_str(keys::DRAFT_REPORT)?;
        let raw_financial: Value = state.require_typed(keys::RAW_FINANCIAL_DATA)?;

        let prompt = self.prompts.compliance(&raw_financial, draft)?;
        let report = self.generator.generate(&prompt).await?;
        write_text(state, keys::FINAL_REPORT, report);

        info!("Compliance validation completed");
        Ok(())
    }
}
