//! Stage graph definition and build-time validation

use crate::error::{ConfigurationError, SEED_PRODUCER};
use invest_core::{Concurrency, Stage, StageDescriptor};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A validated, fixed stage topology
///
/// The graph has two parts: a parallel group whose members run concurrently
/// and only see the seed keys, followed by a sequential chain that runs in
/// declared order. A graph can only be obtained from
/// [`StageGraphBuilder::build`], which rejects overlapping outputs and inputs
/// without a producer.
///
/// # Example
///
/// ```ignore
/// let graph = StageGraph::builder()
///     .seed_keys(["ticker", "company_name", "current_date"])
///     .parallel(quantitative)
///     .parallel(market_research)
///     .then(risk)
///     .then(report)
///     .then(compliance)
///     .build()?;
/// ```
pub struct StageGraph {
    seed_keys: Vec<String>,
    parallel: Vec<Arc<dyn Stage>>,
    sequential: Vec<Arc<dyn Stage>>,
}

impl StageGraph {
    /// Create a new graph builder
    pub fn builder() -> StageGraphBuilder {
        StageGraphBuilder::new()
    }

    /// Keys the caller must seed before a run
    pub fn seed_keys(&self) -> &[String] {
        &self.seed_keys
    }

    /// Members of the parallel group
    pub fn parallel_stages(&self) -> &[Arc<dyn Stage>] {
        &self.parallel
    }

    /// The sequential chain, in execution order
    pub fn sequential_stages(&self) -> &[Arc<dyn Stage>] {
        &self.sequential
    }

    /// Descriptors for every stage, parallel group first
    pub fn descriptors(&self) -> Vec<StageDescriptor> {
        self.parallel
            .iter()
            .map(|s| StageDescriptor::of(s.as_ref(), Concurrency::ParallelGroup))
            .chain(
                self.sequential
                    .iter()
                    .map(|s| StageDescriptor::of(s.as_ref(), Concurrency::Sequential)),
            )
            .collect()
    }

    /// One-line topology summary, e.g. `[a + b] -> c -> d`
    pub fn describe(&self) -> String {
        let mut parts = Vec::with_capacity(self.sequential.len() + 1);
        if !self.parallel.is_empty() {
            let group: Vec<&str> = self.parallel.iter().map(|s| s.name()).collect();
            parts.push(format!("[{}]", group.join(" + ")));
        }
        parts.extend(self.sequential.iter().map(|s| s.name().to_string()));
        parts.join(" -> ")
    }

    /// Total number of stages
    pub fn len(&self) -> usize {
        self.parallel.len() + self.sequential.len()
    }

    /// Check if the graph has no stages
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for StageGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageGraph")
            .field("seed_keys", &self.seed_keys)
            .field("topology", &self.describe())
            .finish()
    }
}

/// Builder for constructing stage graphs
#[derive(Default)]
pub struct StageGraphBuilder {
    seed_keys: Vec<String>,
    parallel: Vec<Arc<dyn Stage>>,
    sequential: Vec<Arc<dyn Stage>>,
}

impl StageGraphBuilder {
    /// Create a new graph builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a key the caller seeds before the run
    pub fn seed_key(mut self, key: impl Into<String>) -> Self {
        self.seed_keys.push(key.into());
        self
    }

    /// Declare several seed keys
    pub fn seed_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.seed_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Add a stage to the parallel group
    pub fn parallel(mut self, stage: Arc<dyn Stage>) -> Self {
        self.parallel.push(stage);
        self
    }

    /// Append a stage to the sequential chain
    pub fn then(mut self, stage: Arc<dyn Stage>) -> Self {
        self.sequential.push(stage);
        self
    }

    /// Validate and build the graph
    ///
    /// Outputs must be globally unique (no two stages, and no stage and a
    /// seed, produce the same key). Parallel members may read only seed keys;
    /// each chain stage may read seeds and anything produced before it.
    pub fn build(self) -> Result<StageGraph, ConfigurationError> {
        if self.parallel.is_empty() && self.sequential.is_empty() {
            return Err(ConfigurationError::EmptyGraph);
        }

        let mut names = HashSet::new();
        for stage in self.parallel.iter().chain(&self.sequential) {
            if !names.insert(stage.name()) {
                return Err(ConfigurationError::DuplicateStage(stage.name().to_string()));
            }
        }

        let mut producers: HashMap<&str, &str> = HashMap::new();
        for key in &self.seed_keys {
            if producers.insert(key.as_str(), SEED_PRODUCER).is_some() {
                return Err(ConfigurationError::OverlappingOutputs {
                    key: key.clone(),
                    stage: SEED_PRODUCER.to_string(),
                    producer: SEED_PRODUCER.to_string(),
                });
            }
        }

        // Siblings are invisible to each other, so check every parallel
        // input before any parallel output is registered.
        for stage in &self.parallel {
            check_inputs(stage.as_ref(), &producers)?;
        }
        for stage in &self.parallel {
            register_outputs(stage.as_ref(), &mut producers)?;
        }

        for stage in &self.sequential {
            check_inputs(stage.as_ref(), &producers)?;
            register_outputs(stage.as_ref(), &mut producers)?;
        }

        Ok(StageGraph {
            seed_keys: self.seed_keys,
            parallel: self.parallel,
            sequential: self.sequential,
        })
    }
}

fn check_inputs(stage: &dyn Stage, producers: &HashMap<&str, &str>) -> Result<(), ConfigurationError> {
    match stage.inputs().iter().find(|key| !producers.contains_key(**key)) {
        Some(key) => Err(ConfigurationError::MissingProducer {
            stage: stage.name().to_string(),
            key: (*key).to_string(),
        }),
        None => Ok(()),
    }
}

fn register_outputs<'a>(
    stage: &'a dyn Stage,
    producers: &mut HashMap<&'a str, &'a str>,
) -> Result<(), ConfigurationError> {
    for key in stage.outputs() {
        if let Some(producer) = producers.insert(*key, stage.name()) {
            return Err(ConfigurationError::OverlappingOutputs {
                key: (*key).to_string(),
                stage: stage.name().to_string(),
                producer: producer.to_string(),
            });
        }
    }
    Ok(())
}
