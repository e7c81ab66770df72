//! Keyword-based news sentiment

use crate::records::{ArticleSentiment, Confidence, OverallSentiment, SentimentLabel};

const POSITIVE_WORDS: [&str; 10] = [
    "growth", "profit", "increase", "rise", "gain", "positive", "strong", "good", "bullish", "up",
];

const NEGATIVE_WORDS: [&str; 10] = [
    "loss", "decline", "fall", "drop", "negative", "weak", "bad", "bearish", "down", "crash",
];

/// Score one piece of text by counting keyword hits
///
/// Matching is by substring on the lowercased text, so "upgrade" counts as
/// "up". Each keyword counts at most once.
pub fn analyze_text(text: &str) -> ArticleSentiment {
    let lower = text.to_lowercase();
    let positive = POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
    let negative = NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();

    let (sentiment, score) = match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => (SentimentLabel::Positive, 1),
        std::cmp::Ordering::Less => (SentimentLabel::Negative, -1),
        std::cmp::Ordering::Equal => (SentimentLabel::Neutral, 0),
    };

    ArticleSentiment {
        sentiment,
        score,
        positive_indicators: positive,
        negative_indicators: negative,
    }
}

/// Aggregate per-article scores into an overall label
pub fn overall_sentiment(scores: &[i32]) -> OverallSentiment {
    if scores.is_empty() {
        return OverallSentiment {
            sentiment: SentimentLabel::Neutral,
            score: None,
            confidence: Confidence::Low,
        };
    }

    let avg = f64::from(scores.iter().sum::<i32>()) / scores.len() as f64;

    let sentiment = if avg > 0.3 {
        SentimentLabel::Positive
    } else if avg < -0.3 {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };

    let confidence = if avg.abs() > 0.5 {
        Confidence::High
    } else if avg.abs() > 0.2 {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    OverallSentiment {
        sentiment,
        score: Some((avg * 100.0).round() / 100.0),
        confidence,
    }
}
