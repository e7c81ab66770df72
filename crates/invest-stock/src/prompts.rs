//! Prompt templates for the synthesis stages
//!
//! Each stage renders one template from a shared [`PromptLibrary`]. Raw
//! records are embedded as pretty-printed JSON so the model sees exactly what
//! the scoring engine and compliance check see.

use crate::error::Result;
use crate::records::{FinancialRecord, MarketNewsRecord, NewsRecord, TechnicalRecord};
use minijinja::{Environment, UndefinedBehavior, context};
use serde::Serialize;
use serde_json::Value;

pub const QUANTITATIVE: &str = "quantitative_analysis";
pub const MARKET_RESEARCH: &str = "market_research";
pub const RISK_ASSESSMENT: &str = "risk_assessment";
pub const REPORT_WRITING: &str = "report_writing";
pub const COMPLIANCE: &str = "compliance_validation";

const QUANTITATIVE_TEMPLATE: &str = r#"You are a Senior Quantitative Analyst with expertise in financial modeling, statistical analysis and technical analysis. You hold a PhD in Finance and have 8 years of experience at top-tier investment firms. Provide an insightful, narrative summary of the following financial data for the stock ticker {{ ticker }}.

Do not just list the numbers. For each key metric, add a brief, italicized *Commentary* on what the number signifies for the company's performance or valuation.

Financial data:
---
{{ financial_data }}
---

Technical indicator data:
---
{{ technical_data }}
---

Based on the data provided, write a professional summary covering:
1. **Valuation:** Market Cap, P/E Ratio and EPS.
2. **Profitability:** Comment on the Profit Margin.
3. **Technicals:** Interpret the current price relative to its moving averages and RSI.
"#;

const MARKET_RESEARCH_TEMPLATE: &str = r#"You are a Senior Market Intelligence Researcher with a background in journalism and financial analysis. You have 10 years of experience tracking market trends, corporate developments and macroeconomic factors. Analyze the market sentiment for {{ company_name }} ({{ ticker }}) based on the news articles below.

Synthesize the findings into a cohesive narrative rather than a list.

Recent news data:
---
{{ news_data }}
---
{% if market_data %}
Broader market headlines, for context only:
---
{{ market_data }}
---
{% endif %}
Based on the news, write a paragraph summarizing:
- The **Overall Sentiment** (for example positive, cautiously optimistic, negative).
- The **Key Drivers** behind this sentiment, referencing significant news stories.
- Any **Potential Catalysts** or future events implied by the news.
"#;

const RISK_ASSESSMENT_TEMPLATE: &str = r#"You are a Senior Risk Assessment Specialist with 12 years of experience in investment risk management. You hold the FRM (Financial Risk Manager) certification and have worked at hedge funds and institutional investment firms. Conduct a comprehensive risk analysis based on the quantitative and market sentiment reports below.

Structure the assessment by risk category and explain each briefly.

Quantitative Analysis:
---
{{ quantitative_analysis }}
---

Market Sentiment Analysis:
---
{{ market_sentiment_analysis }}
---

Cover:
1. **Financial Risks:** valuation concerns (such as a high P/E ratio) and financial stability.
2. **Market Risks:** how market sentiment and broader trends could affect the stock.
3. **Operational & Business Model Risks:** key business challenges or competitive threats.
4. Conclude with an **Overall Risk Rating** (Low, Moderate or Elevated) and list the top 3 key risk factors.
"#;

const REPORT_WRITING_TEMPLATE: &str = r#"You are a Senior Investment Report Writer at a top-tier investment firm with 8 years of experience writing research for institutional investors, known for turning complex financial analysis into clear, actionable recommendations.

Synthesize the analyses below into a single, comprehensive, professionally formatted investment report for **{{ company_name }} ({{ ticker }})** in Markdown. The report must be dated **{{ current_date }}**.

1. Quantitative Analysis:
---
{{ quantitative_analysis }}
---

2. Market Sentiment Analysis:
---
{{ market_sentiment_analysis }}
---

3. Risk Assessment:
---
{{ risk_assessment }}
---

Follow this exact structure:
1. **Executive Summary:** a concise overview that states the investment recommendation (Buy, Hold or Sell) upfront with a brief justification.
2. **Quantitative Analysis:** the quantitative findings, keeping the italicized *Commentary* for each key metric.
3. **Market Sentiment Analysis:** the narrative summary of market sentiment.
4. **Risk Assessment:** the primary risks by category and the overall risk rating.
5. **Investment Thesis and Rationale:** a detailed, convincing argument for the recommendation that ties together quantitative strengths, market mood and risks.
6. **Conclusion and Next Steps:** a brief summary with actionable next steps and factors to monitor.

Adopt a formal, institutional tone. The report must read as if written by a single expert author. Do not include placeholders such as '[Your Firm Name]'.
"#;

const COMPLIANCE_TEMPLATE: &str = r#"You are a Senior Compliance Validator with 10 years of experience in financial services compliance and quality assurance. You hold Series 7, 66 and 24 licenses and know investment advisory regulations in depth. Perform the final review of the investment report below.

Focus on two areas:
1. Factual accuracy: cross-reference every financial metric in the report against the raw data. Values such as P/E Ratio, Market Cap and EPS must be IDENTICAL to the raw data. Correct any inconsistency.
2. Compliance and formatting: the report must include a proper disclaimer, be professionally formatted and contain no placeholder text such as '[Your Firm Name]'.

Raw financial data for fact-checking:
---
{{ raw_financial_data }}
---

Draft report to validate:
---
{{ draft_report }}
---

Return the final, validated and corrected report. Output only the clean report text.
"#;

/// Compiled prompt templates
pub struct PromptLibrary {
    env: Environment<'static>,
}

impl PromptLibrary {
    /// Compile all stage prompts
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);

        env.add_template(QUANTITATIVE, QUANTITATIVE_TEMPLATE)?;
        env.add_template(MARKET_RESEARCH, MARKET_RESEARCH_TEMPLATE)?;
        env.add_template(RISK_ASSESSMENT, RISK_ASSESSMENT_TEMPLATE)?;
        env.add_template(REPORT_WRITING, REPORT_WRITING_TEMPLATE)?;
        env.add_template(COMPLIANCE, COMPLIANCE_TEMPLATE)?;

        Ok(Self { env })
    }

    /// Render a template by name with an arbitrary context
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String> {
        Ok(self.env.get_template(name)?.render(ctx)?)
    }

    pub fn quantitative(
        &self,
        ticker: &str,
        financial: &FinancialRecord,
        technical: &TechnicalRecord,
    ) -> Result<String> {
        self.render(
            QUANTITATIVE,
            context! {
                ticker,
                financial_data => serde_json::to_string_pretty(financial)?,
                technical_data => serde_json::to_string_pretty(technical)?,
            },
        )
    }

    /// Market headlines are optional context; the section is omitted without them
    pub fn market_research(
        &self,
        company_name: &str,
        ticker: &str,
        news: &NewsRecord,
        market: Option<&MarketNewsRecord>,
    ) -> Result<String> {
        let market_data = market.map(serde_json::to_string_pretty).transpose()?;
        self.render(
            MARKET_RESEARCH,
            context! {
                company_name,
                ticker,
                news_data => serde_json::to_string_pretty(news)?,
                market_data,
            },
        )
    }

    pub fn risk_assessment(&self, quantitative_analysis: &str, market_sentiment_analysis: &str) -> Result<String> {
        self.render(
            RISK_ASSESSMENT,
            context! { quantitative_analysis, market_sentiment_analysis },
        )
    }

    pub fn report_writing(&self, inputs: &ReportInputs<'_>) -> Result<String> {
        self.render(REPORT_WRITING, inputs)
    }

    pub fn compliance(&self, raw_financial_data: &Value, draft_report: &str) -> Result<String> {
        self.render(
            COMPLIANCE,
            context! {
                raw_financial_data => serde_json::to_string_pretty(raw_financial_data)?,
                draft_report,
            },
        )
    }
}

/// Everything the report writer needs
#[derive(Debug, Serialize)]
pub struct ReportInputs<'a> {
    pub company_name: &'a str,
    pub ticker: &'a str,
    pub current_date: &'a str,
    pub quantitative_analysis: &'a str,
    pub market_sentiment_analysis: &'a str,
    pub risk_assessment: &'a str,
}
