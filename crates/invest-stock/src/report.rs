//! Markdown rendering of a finished analysis

use crate::pipeline::AnalysisOutcome;

const MISSING_REPORT: &str = "Report could not be generated.";

/// Render the investment report for a complete run; aborted runs have none
pub fn render_report(outcome: &AnalysisOutcome) -> Option<String> {
    if !outcome.is_complete() {
        return None;
    }
    let score = outcome.score.as_ref()?;

    let ticker = &outcome.subject.ticker;
    let company = outcome.subject.company_name.as_deref().unwrap_or(ticker);
    let body = outcome.final_report().unwrap_or(MISSING_REPORT);

    Some(format!(
        "# Investment Report: {company} ({ticker})\n\n\
         **Proprietary Investment Score: {:.2}/10 ({})**\n\n\
         {body}\n",
        score.total, score.recommendation
    ))
}

/// File name the report is saved under, e.g. `investment_report_aapl.md`
pub fn report_file_name(ticker: &str) -> String {
    format!("investment_report_{}.md", ticker.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use crate::pipeline::SubjectConfig;
    use crate::scoring;
    use invest_core::{AnalysisState, StageError};
    use invest_workflow::{RunStatus, StageFailure};
    use serde_json::json;
    use uuid::Uuid;

    fn outcome(state: AnalysisState, status: RunStatus) -> AnalysisOutcome {
        let snapshot = state.snapshot();
        let complete = status == RunStatus::Complete;
        AnalysisOutcome {
            run_id: Uuid::nil(),
            status,
            subject: SubjectConfig::new("aapl")
                .with_company_name("Apple Inc")
                .with_current_date("January 02, 2026"),
            score: complete.then(|| scoring::score_snapshot(&snapshot)),
            final_state: snapshot,
            failures: if complete {
                Vec::new()
            } else {
                vec![StageFailure {
                    stage: "risk_assessment".to_string(),
                    error: StageError::MissingInput("quantitative_analysis".to_string()),
                }]
            },
            phases: Vec::new(),
        }
    }

    #[test]
    fn test_render_complete_run() {
        let state = AnalysisState::new()
            .with(keys::RAW_FINANCIAL_DATA, json!({"pe_ratio": 12.0, "profit_margin": 0.3}))
            .with(keys::RAW_NEWS_DATA, json!({"overall_sentiment": {"sentiment": "Positive"}}))
            .with(keys::FINAL_REPORT, json!("## Executive Summary\nBuy."));

        let report = render_report(&outcome(state, RunStatus::Complete)).unwrap();

        assert_eq!(
            report,
            "# Investment Report: Apple Inc (AAPL)\n\n\
             **Proprietary Investment Score: 9.80/10 (Strong Buy)**\n\n\
             ## Executive Summary\nBuy.\n"
        );
    }

    #[test]
    fn test_render_without_final_report() {
        let report = render_report(&outcome(AnalysisState::new(), RunStatus::Complete)).unwrap();
        assert!(report.contains("**Proprietary Investment Score: 3.40/10 (Sell)**"));
        assert!(report.ends_with("Report could not be generated.\n"));
    }

    #[test]
    fn test_aborted_run_has_no_report() {
        let state = AnalysisState::new().with(keys::FINAL_REPORT, json!("stale"));
        assert!(render_report(&outcome(state, RunStatus::Aborted)).is_none());
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(report_file_name("AAPL"), "investment_report_aapl.md");
        assert_eq!(report_file_name(" BRK.B "), "investment_report_brk.b.md");
    }
}
