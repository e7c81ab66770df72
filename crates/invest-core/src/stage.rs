//! Stage trait definition

use crate::{AnalysisState, StageError};
use async_trait::async_trait;
use std::fmt;

/// How the orchestrator schedules a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Concurrency {
    /// Runs concurrently with the other members of the parallel group
    ParallelGroup,
    /// Runs alone, in declared order, after the parallel group
    Sequential,
}

impl fmt::Display for Concurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concurrency::ParallelGroup => write!(f, "parallel-group"),
            Concurrency::Sequential => write!(f, "sequential"),
        }
    }
}

/// A named unit of work in a pipeline
///
/// A stage reads its declared inputs from the [`AnalysisState`] and, on
/// success, writes its declared outputs. It must not write any other key.
/// A stage that cannot satisfy its postconditions returns an error; partial
/// writes before the error are tolerated, but nothing downstream runs.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Unique stage name within a graph
    fn name(&self) -> &str;

    /// Keys this stage reads
    fn inputs(&self) -> &[&'static str];

    /// Keys this stage writes on success
    fn outputs(&self) -> &[&'static str];

    /// Run the stage against the state
    async fn execute(&self, state: &mut AnalysisState) -> Result<(), StageError>;
}

/// Static description of a stage as placed in a graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDescriptor {
    pub name: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub concurrency: Concurrency,
}

impl StageDescriptor {
    /// Describe a stage under the given concurrency hint
    pub fn of(stage: &dyn Stage, concurrency: Concurrency) -> Self {
        Self {
            name: stage.name().to_string(),
            inputs: stage.inputs().iter().map(ToString::to_string).collect(),
            outputs: stage.outputs().iter().map(ToString::to_string).collect(),
            concurrency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl Stage for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn inputs(&self) -> &[&'static str] {
            &["ticker"]
        }

        fn outputs(&self) -> &[&'static str] {
            &["echo"]
        }

        async fn execute(&self, state: &mut AnalysisState) -> Result<(), StageError> {
            let ticker = state.require_str("ticker")?.to_string();
            state.set("echo", json!(ticker));
            Ok(())
        }
    }

    #[test]
    fn test_descriptor_of() {
        let desc = StageDescriptor::of(&Echo, Concurrency::Sequential);
        assert_eq!(desc.name, "echo");
        assert_eq!(desc.inputs, vec!["ticker"]);
        assert_eq!(desc.outputs, vec!["echo"]);
        assert_eq!(desc.concurrency.to_string(), "sequential");
    }

    #[test]
    fn test_stage_execute() {
        let mut state = AnalysisState::new().with("ticker", json!("NVDA"));
        tokio_test::block_on(Echo.execute(&mut state)).unwrap();
        assert_eq!(state.get_str("echo"), Some("NVDA"));

        let mut empty = AnalysisState::new();
        let err = tokio_test::block_on(Echo.execute(&mut empty)).unwrap_err();
        assert_eq!(err, StageError::MissingInput("ticker".to_string()));
    }
}
