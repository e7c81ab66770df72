use super::{QUANTITATIVE_ANALYSIS, write_text};
use crate::keys;
use crate::prompts::PromptLibrary;
use crate::providers::MarketDataProvider;
use async_trait::async_trait;
use invest_core::{AnalysisState, Stage, StageError};
use invest_llm::TextGenerator;
use std::sync::Arc;
use tracing::info;

/// Gathers market data and writes a quantitative narrative
pub struct QuantitativeAnalysisStage {
    market: Arc<dyn MarketDataProvider>,
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptLibrary>,
}

impl QuantitativeAnalysisStage {
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        generator: Arc<dyn TextGenerator>,
        prompts: Arc<PromptLibrary>,
    ) -> Self {
        Self {
            market,
            generator,
            prompts,
        }
    }
}

#[async_trait]
impl Stage for QuantitativeAnalysisStage {
    fn name(&self) -> &str {
        QUANTITATIVE_ANALYSIS
    }

    fn inputs(&self) -> &[&'static str] {
        &[keys::TICKER]
    }

    fn outputs(&self) -> &[&'static str] {
        &[
            keys::RAW_FINANCIAL_DATA,
            keys::RAW_TECHNICAL_DATA,
            keys::QUANTITATIVE_ANALYSIS,
        ]
    }

    async fn execute(&self, state: &mut AnalysisState) -> Result<(), StageError> {
        let ticker = state.require_str(keys::TICKER)?.to_string();
        info!(ticker = %ticker, "Starting quantitative analysis");

        let (financial, technical) = tokio::try_join!(
            self.market.get_snapshot(&ticker),
            self.market.get_technicals(&ticker)
        )?;

        state.set_typed(keys::RAW_FINANCIAL_DATA, &financial)?;
        state.set_typed(keys::RAW_TECHNICAL_DATA, &technical)?;

        let prompt = self.prompts.quantitative(&ticker, &financial, &technical)?;
        let analysis = self.generator.generate(&prompt).await?;
        write_text(state, keys::QUANTITATIVE_ANALYSIS, analysis);

        info!(ticker = %ticker, "Quantitative analysis completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StockError;
    use crate::providers::MockMarketDataProvider;
    use crate::test_support::{FakeGenerator, financial_record, technical_record};
    use serde_json::json;

    fn stage(market: MockMarketDataProvider, generator: Arc<FakeGenerator>) -> QuantitativeAnalysisStage {
        QuantitativeAnalysisStage::new(
            Arc::new(market),
            generator,
            Arc::new(PromptLibrary::new().unwrap()),
        )
    }

    #[tokio::test]
    async fn test_writes_raw_data_and_analysis() {
        let mut market = MockMarketDataProvider::new();
        market
            .expect_get_snapshot()
            .withf(|symbol| symbol == "AAPL")
            .times(1)
            .returning(|s| Ok(financial_record(s, Some(29.4), Some(0.24))));
        market
            .expect_get_technicals()
            .times(1)
            .returning(|s| Ok(technical_record(s)));

        let generator = Arc::new(FakeGenerator::replying("Valuation is rich"));
        let stage = stage(market, generator.clone());

        let mut state = AnalysisState::new().with(keys::TICKER, json!("AAPL"));
        stage.execute(&mut state).await.unwrap();

        assert_eq!(state.get(keys::RAW_FINANCIAL_DATA).unwrap()["pe_ratio"], json!(29.4));
        assert_eq!(state.get(keys::RAW_TECHNICAL_DATA).unwrap()["rsi_signal"], json!("Neutral"));
        assert_eq!(state.get_str(keys::QUANTITATIVE_ANALYSIS), Some("Valuation is rich #1"));
        assert!(generator.prompts()[0].contains("\"pe_ratio\": 29.4"));
    }

    #[tokio::test]
    async fn test_provider_failure_skips_generation() {
        let mut market = MockMarketDataProvider::new();
        market.expect_get_snapshot().returning(|s| {
            Err(StockError::DataUnavailable {
                symbol: s.to_string(),
                reason: "No data found for ticker".to_string(),
            })
        });
        market
            .expect_get_technicals()
            .returning(|s| Ok(technical_record(s)));

        let generator = Arc::new(FakeGenerator::replying("unused"));
        let stage = stage(market, generator.clone());

        let mut state = AnalysisState::new().with(keys::TICKER, json!("ZZZZ"));
        let err = stage.execute(&mut state).await.unwrap_err();

        assert!(matches!(err, StageError::Collaborator(m) if m.contains("ZZZZ")));
        assert_eq!(generator.calls(), 0);
        assert!(!state.has(keys::QUANTITATIVE_ANALYSIS));
    }

    #[tokio::test]
    async fn test_missing_ticker() {
        let stage = stage(
            MockMarketDataProvider::new(),
            Arc::new(FakeGenerator::replying("unused")),
        );
        let err = stage.execute(&mut AnalysisState::new()).await.unwrap_err();
        assert_eq!(err, StageError::MissingInput(keys::TICKER.to_string()));
    }

    #[tokio::test]
    async fn test_generation_failure() {
        let mut market = MockMarketDataProvider::new();
        market
            .expect_get_snapshot()
            .returning(|s| Ok(financial_record(s, None, None)));
        market
            .expect_get_technicals()
            .returning(|s| Ok(technical_record(s)));

        let stage = stage(market, Arc::new(FakeGenerator::failing()));
        let mut state = AnalysisState::new().with(keys::TICKER, json!("AAPL"));

        let err = stage.execute(&mut state).await.unwrap_err();
        assert!(matches!(err, StageError::Collaborator(m) if m.starts_with("text generation")));
        // raw data written before the failure stays in the scratch state
        assert!(state.has(keys::RAW_FINANCIAL_DATA));
    }
}
