//! Graph configuration errors

use thiserror::Error;

/// Name used as the producer of seed keys in error messages
pub const SEED_PRODUCER: &str = "<seed>";

/// A stage graph or pipeline configuration that cannot run
///
/// All of these are raised before any stage executes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("stage graph has no stages")]
    EmptyGraph,

    #[error("duplicate stage name `{0}`")]
    DuplicateStage(String),

    #[error("output `{key}` of stage `{stage}` is already produced by `{producer}`")]
    OverlappingOutputs {
        key: String,
        stage: String,
        producer: String,
    },

    #[error("stage `{stage}` reads `{key}` but no earlier stage or seed produces it")]
    MissingProducer { stage: String, key: String },

    #[error("max_parallelism must be at least 1, got {0}")]
    InvalidParallelism(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ConfigurationError::OverlappingOutputs {
            key: "ticker".to_string(),
            stage: "market_research".to_string(),
            producer: SEED_PRODUCER.to_string(),
        };
        assert_eq!(
            err.to_string(),
            "output `ticker` of stage `market_research` is already produced by `<seed>`"
        );

        let err = ConfigurationError::MissingProducer {
            stage: "risk_assessment".to_string(),
            key: "quantitative_analysis".to_string(),
        };
        assert!(err.to_string().contains("no earlier stage"));
    }
}
