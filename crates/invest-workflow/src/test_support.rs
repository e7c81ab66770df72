//! Spy stages shared by the graph and pipeline tests

use async_trait::async_trait;
use invest_core::{AnalysisState, Stage, StageError};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Counts concurrent executions across a set of stages
#[derive(Debug, Default)]
pub struct Gauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Fail,
    Panic,
    /// Succeed without writing declared outputs
    Silent,
}

pub struct Spy {
    name: &'static str,
    inputs: Vec<&'static str>,
    outputs: Vec<&'static str>,
    behavior: Behavior,
    delay: Duration,
    extra_write: Option<&'static str>,
    forbidden: Option<&'static str>,
    gauge: Option<Arc<Gauge>>,
    calls: Arc<AtomicUsize>,
}

impl Spy {
    pub fn new(name: &'static str, inputs: &[&'static str], outputs: &[&'static str]) -> Self {
        Self {
            name,
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
            behavior: Behavior::Succeed,
            delay: Duration::ZERO,
            extra_write: None,
            forbidden: None,
            gauge: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }

    /// Also write a key the stage did not declare
    pub fn extra_write(mut self, key: &'static str) -> Self {
        self.extra_write = Some(key);
        self
    }

    /// Fail if this key is visible when the stage runs
    pub fn forbid(mut self, key: &'static str) -> Self {
        self.forbidden = Some(key);
        self
    }

    pub fn gauge(mut self, gauge: Arc<Gauge>) -> Self {
        self.gauge = Some(gauge);
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Stage for Spy {
    fn name(&self) -> &str {
        self.name
    }

    fn inputs(&self) -> &[&'static str] {
        &self.inputs
    }

    fn outputs(&self) -> &[&'static str] {
        &self.outputs
    }

    async fn execute(&self, state: &mut AnalysisState) -> Result<(), StageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gauge) = &self.gauge {
            gauge.enter();
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(gauge) = &self.gauge {
            gauge.leave();
        }

        if let Some(key) = self.forbidden.filter(|key| state.has(key)) {
            return Err(StageError::InvalidValue {
                key: key.to_string(),
                reason: "visible before the barrier".to_string(),
            });
        }

        match self.behavior {
            Behavior::Fail => return Err(StageError::collaborator(format!("{} exploded", self.name))),
            Behavior::Panic => panic!("{} panicked", self.name),
            Behavior::Silent => return Ok(()),
            Behavior::Succeed => {}
        }

        for input in &self.inputs {
            if !state.has(input) {
                return Err(StageError::MissingInput((*input).to_string()));
            }
        }
        for output in &self.outputs {
            state.set(*output, json!(format!("{} from {}", output, self.name)));
        }
        if let Some(key) = self.extra_write {
            state.set(key, json!("stray"));
        }
        Ok(())
    }
}
