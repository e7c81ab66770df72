use super::{MARKET_RESEARCH, require_all, write_text};
use crate::keys;
use crate::prompts::PromptLibrary;
use crate::providers::NewsProvider;
use async_trait::async_trait;
use invest_core::{AnalysisState, Stage, StageError};
use invest_llm::TextGenerator;
use std::sync::Arc;
use tracing::{info, warn};

const MARKET_CATEGORY: &str = "business";
const MARKET_COUNTRY: &str = "us";

/// Gathers company news and writes a market-sentiment narrative
pub struct MarketResearchStage {
    news: Arc<dyn NewsProvider>,
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptLibrary>,
}

impl MarketResearchStage {
    pub fn new(
        news: Arc<dyn NewsProvider>,
        generator: Arc<dyn TextGenerator>,
        prompts: Arc<PromptLibrary>,
    ) -> Self {
        Self {
            news,
            generator,
            prompts,
        }
    }
}

#[async_trait]
impl Stage for MarketResearchStage {
    fn name(&self) -> &str {
        MARKET_RESEARCH
    }

    fn inputs(&self) -> &[&'static str] {
        &[keys::TICKER, keys::COMPANY_NAME]
    }

    fn outputs(&self) -> &[&'static str] {
        &[keys::RAW_NEWS_DATA, keys::MARKET_SENTIMENT_ANALYSIS]
    }

    async fn execute(&self, state: &mut AnalysisState) -> Result<(), StageError> {
        let [ticker, company_name] = require_all(state, [keys::TICKER, keys::COMPANY_NAME])?;
        let (ticker, company_name) = (ticker.to_string(), company_name.to_string());
        info!(company = %company_name, "Starting market research");

        let news = self.news.get_company_news(&company_name, &ticker).await?;
        state.set_typed(keys::RAW_NEWS_DATA, &news)?;

        let market = match self.news.get_market_news(MARKET_CATEGORY, MARKET_COUNTRY).await {
            Ok(market) => Some(market),
            Err(e) => {
                warn!(error = %e, "Market headlines unavailable");
                None
            }
        };

        let prompt = self
            .prompts
            .market_research(&company_name, &ticker, &news, market.as_ref())?;
        let analysis = self.generator.generate(&prompt).await?;
        write_text(state, keys::MARKET_SENTIMENT_ANALYSIS, analysis);

        info!(
            company = %company_name,
            articles = news.total_articles,
            "Market research completed"
        );
        Ok(())
    }
}
