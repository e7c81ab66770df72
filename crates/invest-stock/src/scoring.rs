//! Deterministic investment scoring
//!
//! Combines valuation (P/E), profitability (profit margin) and news sentiment
//! into a 0-10 score and a recommendation band. Scoring is total: missing or
//! non-numeric inputs fall back to fixed defaults and are listed in
//! [`ScoreResult::degraded`].

use crate::keys;
use invest_core::StateSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const VALUATION_WEIGHT: f64 = 0.4;
const PROFITABILITY_WEIGHT: f64 = 0.4;
const SENTIMENT_WEIGHT: f64 = 0.2;

const DEFAULT_VALUATION: u8 = 3;
const DEFAULT_PROFITABILITY: u8 = 3;
const NEUTRAL_SENTIMENT: u8 = 5;

/// Recommendation band derived from the total score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    Buy,
    Hold,
    Sell,
}

impl Recommendation {
    /// Band for a rounded total; boundaries are exclusive
    pub fn from_total(total: f64) -> Self {
        if total > 7.5 {
            Self::StrongBuy
        } else if total > 6.0 {
            Self::Buy
        } else if total > 4.0 {
            Self::Hold
        } else {
            Self::Sell
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::StrongBuy => "Strong Buy",
            Self::Buy => "Buy",
            Self::Hold => "Hold",
            Self::Sell => "Sell",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A scored component that can fall back to its default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreComponent {
    Valuation,
    Profitability,
    Sentiment,
}

impl fmt::Display for ScoreComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valuation => f.write_str("valuation"),
            Self::Profitability => f.write_str("profitability"),
            Self::Sentiment => f.write_str("sentiment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub valuation: u8,
    pub profitability: u8,
    pub sentiment: u8,
}

/// Immutable scoring outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Weighted total rounded to two decimals, in [1.0, 10.0]
    pub total: f64,
    pub recommendation: Recommendation,
    pub components: ComponentScores,
    /// Components that used a default because their input was missing
    pub degraded: Vec<ScoreComponent>,
}

impl ScoreResult {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Valuation sub-score from a P/E ratio; `None` when the ratio is unusable
pub fn valuation_score(pe_ratio: Option<f64>) -> Option<u8> {
    let pe = pe_ratio.filter(|v| v.is_finite())?;
    Some(if pe < 15.0 {
        10
    } else if pe < 25.0 {
        7
    } else if pe < 40.0 {
        4
    } else {
        1
    })
}

/// Profitability sub-score from a profit margin fraction
pub fn profitability_score(profit_margin: Option<f64>) -> Option<u8> {
    let margin = profit_margin.filter(|v| v.is_finite())?;
    Some(if margin > 0.20 {
        10
    } else if margin > 0.10 {
        7
    } else if margin > 0.0 {
        4
    } else {
        1
    })
}

/// Sentiment sub-score from a label; `None` when there is no label
pub fn sentiment_score(label: Option<&str>) -> Option<u8> {
    let label = label?.to_lowercase();
    Some(match label.as_str() {
        "positive" => 9,
        "neutral" => NEUTRAL_SENTIMENT,
        _ => 1,
    })
}

/// Score typed inputs
pub fn score(pe_ratio: Option<f64>, profit_margin: Option<f64>, sentiment: Option<&str>) -> ScoreResult {
    let mut degraded = Vec::new();

    let valuation = valuation_score(pe_ratio).unwrap_or_else(|| {
        degraded.push(ScoreComponent::Valuation);
        DEFAULT_VALUATION
    });
    let profitability = profitability_score(profit_margin).unwrap_or_else(|| {
        degraded.push(ScoreComponent::Profitability);
        DEFAULT_PROFITABILITY
    });
    let sentiment = sentiment_score(sentiment).unwrap_or_else(|| {
        degraded.push(ScoreComponent::Sentiment);
        NEUTRAL_SENTIMENT
    });

    let weighted = VALUATION_WEIGHT * f64::from(valuation)
        + PROFITABILITY_WEIGHT * f64::from(profitability)
        + SENTIMENT_WEIGHT * f64::from(sentiment);
    let total = (weighted * 100.0).round() / 100.0;

    ScoreResult {
        total,
        recommendation: Recommendation::from_total(total),
        components: ComponentScores {
            valuation,
            profitability,
            sentiment,
        },
        degraded,
    }
}

/// Score raw financial and news records as stored in the analysis state
///
/// Reads `pe_ratio` and `profit_margin` from the financial record and
/// `overall_sentiment.sentiment` from the news record. Absent records, absent
/// fields and non-numeric values all take the defaults.
pub fn score_records(financial: Option<&Value>, news: Option<&Value>) -> ScoreResult {
    let number = |key: &str| financial.and_then(|f| f.get(key)).and_then(Value::as_f64);
    let label = news
        .and_then(|n| n.get("overall_sentiment"))
        .and_then(|o| o.get("sentiment"))
        .and_then(Value::as_str);

    score(number("pe_ratio"), number("profit_margin"), label)
}

/// Score the raw data held in a finished run's state
pub fn score_snapshot(state: &StateSnapshot) -> ScoreResult {
    score_records(
        state.get(keys::RAW_FINANCIAL_DATA),
        state.get(keys::RAW_NEWS_DATA),
    )
}
