//! The five analysis stages
//!
//! Quantitative analysis and market research gather raw data and run in
//! parallel; risk assessment, report writing and compliance validation form
//! the sequential synthesis chain.

mod compliance;
mod market_research;
mod quantitative;
mod report;
mod risk;

pub use compliance::ComplianceValidationStage;
pub use market_research::MarketResearchStage;
pub use quantitative::QuantitativeAnalysisStage;
pub use report::ReportWritingStage;
pub use risk::RiskAssessmentStage;

use invest_core::{AnalysisState, StageError};
use serde_json::Value;

pub const QUANTITATIVE_ANALYSIS: &str = "quantitative_analysis";
pub const MARKET_RESEARCH: &str = "market_research";
pub const RISK_ASSESSMENT: &str = "risk_assessment";
pub const REPORT_WRITING: &str = "report_writing";
pub const COMPLIANCE_VALIDATION: &str = "compliance_validation";

/// Store generated narrative text under `key`
fn write_text(state: &mut AnalysisState, key: &str, text: String) {
    state.set(key, Value::String(text));
}

/// Read several required string inputs, reporting the first one missing
fn require_all<'a, const N: usize>(
    state: &'a AnalysisState,
    keys: [&str; N],
) -> Result<[&'a str; N], StageError> {
    let mut values = [""; N];
    for (slot, key) in values.iter_mut().zip(keys) {
        *slot = state.require_str(key)?;
    }
    Ok(values)
}
