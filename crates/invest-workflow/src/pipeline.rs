//! Pipeline orchestrator
//!
//! Runs the parallel group of a [`StageGraph`] concurrently behind a barrier,
//! then the sequential chain in declared order, aborting on the first failure.

use crate::error::ConfigurationError;
use crate::graph::StageGraph;
use crate::outcome::{PhaseTracker, PipelineOutcome, RunPhase, RunStatus, StageFailure};
use futures::FutureExt;
use futures::future::join_all;
use invest_core::{AnalysisState, Stage, StageError};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Upper bound on parallel-group stages running at once
    pub max_parallelism: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { max_parallelism: 2 }
    }
}

impl PipelineConfig {
    pub fn with_max_parallelism(mut self, max_parallelism: usize) -> Self {
        self.max_parallelism = max_parallelism;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_parallelism == 0 {
            return Err(ConfigurationError::InvalidParallelism(self.max_parallelism));
        }
        Ok(())
    }
}

/// Executes a validated stage graph
///
/// Every stage runs on its own copy of the state and only its declared outputs
/// are merged back. Parallel members merge after the barrier, and only if every
/// member succeeded; a sequential stage merges when it succeeds.
pub struct Pipeline {
    graph: StageGraph,
    config: PipelineConfig,
    permits: Arc<Semaphore>,
}

impl Pipeline {
    /// Create a pipeline over a built graph
    pub fn new(graph: StageGraph, config: PipelineConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let permits = Arc::new(Semaphore::new(config.max_parallelism));
        Ok(Self {
            graph,
            config,
            permits,
        })
    }

    pub fn graph(&self) -> &StageGraph {
        &self.graph
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the graph over a seeded state with a fresh run id
    pub async fn run(&self, state: AnalysisState) -> PipelineOutcome {
        self.run_with_id(Uuid::new_v4(), state).await
    }

    /// Run the graph over a seeded state
    pub async fn run_with_id(&self, run_id: Uuid, mut state: AnalysisState) -> PipelineOutcome {
        let span = info_span!("pipeline_run", %run_id);
        async move {
            let mut phases = PhaseTracker::new(run_id);
            info!(topology = %self.graph.describe(), "Pipeline run started");

            for key in self.graph.seed_keys() {
                if !state.has(key) {
                    warn!(key = %key, "Seed key missing at run start");
                }
            }

            phases.advance(RunPhase::Gathering);
            let failures = self.run_parallel_group(&mut state).await;
            if !failures.is_empty() {
                error!(
                    failed = ?failures.iter().map(|f| f.stage.as_str()).collect::<Vec<_>>(),
                    "Parallel group failed, aborting run"
                );
                phases.advance(RunPhase::Aborted);
                return finish(run_id, &state, failures, phases);
            }
            phases.advance(RunPhase::Gathered);

            phases.advance(RunPhase::Synthesizing);
            for stage in self.graph.sequential_stages() {
                if let Err(err) = self.run_sequential(stage.as_ref(), &mut state).await {
                    error!(stage = stage.name(), "Sequential chain aborted");
                    phases.advance(RunPhase::Aborted);
                    let failure = StageFailure {
                        stage: stage.name().to_string(),
                        error: err,
                    };
                    return finish(run_id, &state, vec![failure], phases);
                }
            }

            phases.advance(RunPhase::Complete);
            info!(keys = state.len(), "Pipeline run complete");
            finish(run_id, &state, Vec::new(), phases)
        }
        .instrument(span)
        .await
    }

    async fn run_parallel_group(&self, state: &mut AnalysisState) -> Vec<StageFailure> {
        let stages = self.graph.parallel_stages();
        if stages.is_empty() {
            return Vec::new();
        }
        info!(
            stages = stages.len(),
            max_parallelism = self.config.max_parallelism,
            "Starting parallel group"
        );

        let handles = stages.iter().map(|stage| {
            let stage = Arc::clone(stage);
            let permits = Arc::clone(&self.permits);
            let mut scratch = state.clone();
            let span = info_span!("stage", name = stage.name());
            tokio::spawn(
                async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|e| StageError::Panicked(e.to_string()))?;
                    execute_logged(stage.as_ref(), &mut scratch).await?;
                    Ok::<_, StageError>(scratch)
                }
                .instrument(span),
            )
        });

        // Barrier: every member finishes before anything is merged.
        let results = join_all(handles).await;
        debug!("Parallel group barrier reached");

        let mut failures = Vec::new();
        let mut finished = Vec::new();
        for (stage, result) in stages.iter().zip(results) {
            match result {
                Ok(Ok(scratch)) => finished.push((stage, scratch)),
                Ok(Err(error)) => failures.push(StageFailure {
                    stage: stage.name().to_string(),
                    error,
                }),
                Err(join_err) => {
                    error!(stage = stage.name(), error = %join_err, "Stage task died");
                    failures.push(StageFailure {
                        stage: stage.name().to_string(),
                        error: StageError::Panicked(join_err.to_string()),
                    });
                }
            }
        }

        if !failures.is_empty() {
            // Successful siblings are discarded.
            return failures;
        }

        for (stage, scratch) in finished {
            merge_declared(stage.as_ref(), state, &scratch);
        }
        info!(keys = ?state.keys().collect::<Vec<_>>(), "Parallel group merged");
        failures
    }

    async fn run_sequential(&self, stage: &dyn Stage, state: &mut AnalysisState) -> Result<(), StageError> {
        let mut scratch = state.clone();
        let span = info_span!("stage", name = stage.name());

        AssertUnwindSafe(execute_logged(stage, &mut scratch))
            .catch_unwind()
            .instrument(span)
            .await
            .unwrap_or_else(|panic| {
                let err = StageError::Panicked(panic_message(panic.as_ref()));
                error!(stage = stage.name(), error = %err, "Stage panicked");
                Err(err)
            })?;

        merge_declared(stage, state, &scratch);
        Ok(())
    }
}

async fn execute_logged(stage: &dyn Stage, state: &mut AnalysisState) -> Result<(), StageError> {
    info!(
        stage = stage.name(),
        state_keys = ?state.keys().collect::<Vec<_>>(),
        "Stage started"
    );
    let started = Instant::now();
    let result = stage.execute(state).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match &result {
        Ok(()) => {
            for key in stage.outputs() {
                if !state.has(key) {
                    warn!(stage = stage.name(), key, "Stage succeeded without writing a declared output");
                }
            }
            info!(stage = stage.name(), elapsed_ms, "Stage completed");
        }
        Err(err) => error!(stage = stage.name(), elapsed_ms, error = %err, "Stage failed"),
    }
    result
}

/// Copy a stage's declared outputs into the shared state
fn merge_declared(stage: &dyn Stage, state: &mut AnalysisState, scratch: &AnalysisState) {
    for key in scratch.keys() {
        let declared = stage.outputs().iter().any(|k| *k == key);
        if declared {
            if let Some(value) = scratch.get(key) {
                state.set(key, value.clone());
            }
        } else if scratch.get(key) != state.get(key) {
            warn!(stage = stage.name(), key, "Dropping undeclared write from stage");
        }
    }
}

fn finish(
    run_id: Uuid,
    state: &AnalysisState,
    failures: Vec<StageFailure>,
    phases: PhaseTracker,
) -> PipelineOutcome {
    let status = if phases.current() == RunPhase::Complete {
        RunStatus::Complete
    } else {
        RunStatus::Aborted
    };
    PipelineOutcome {
        run_id,
        status,
        state: state.snapshot(),
        failures,
        phases: phases.into_history(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "stage panicked".to_string()
    }
}
