//! Stage graph construction and pipeline orchestration for invest-rs
//!
//! A [`StageGraph`] is validated once at build time. A [`Pipeline`] then runs
//! it: the parallel group concurrently behind a barrier, the sequential chain
//! in order, aborting the run on the first failure.

pub mod error;
pub mod graph;
pub mod outcome;
pub mod pipeline;

#[cfg(test)]
mod test_support;

// Re-export for convenience
pub use error::ConfigurationError;
pub use graph::{StageGraph, StageGraphBuilder};
pub use outcome::{PipelineOutcome, RunPhase, RunStatus, StageFailure};
pub use pipeline::{Pipeline, PipelineConfig};
