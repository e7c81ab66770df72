//! Run phases and outcomes

use invest_core::{StageError, StateSnapshot};
use serde::Serialize;
use std::fmt;
use tracing::{error, info};
use uuid::Uuid;

/// Phase of a single pipeline run
///
/// `Init -> Gathering -> (Gathered | Aborted) -> Synthesizing -> (Complete | Aborted)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunPhase {
    Init,
    Gathering,
    Gathered,
    Synthesizing,
    Complete,
    Aborted,
}

impl RunPhase {
    /// Whether `next` is a legal successor of this phase
    pub fn can_transition_to(self, next: RunPhase) -> bool {
        matches!(
            (self, next),
            (RunPhase::Init, RunPhase::Gathering)
                | (RunPhase::Gathering, RunPhase::Gathered | RunPhase::Aborted)
                | (RunPhase::Gathered, RunPhase::Synthesizing)
                | (RunPhase::Synthesizing, RunPhase::Complete | RunPhase::Aborted)
        )
    }

    /// Complete and Aborted are terminal
    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Complete | RunPhase::Aborted)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Init => "INIT",
            RunPhase::Gathering => "GATHERING",
            RunPhase::Gathered => "GATHERED",
            RunPhase::Synthesizing => "SYNTHESIZING",
            RunPhase::Complete => "COMPLETE",
            RunPhase::Aborted => "ABORTED",
        };
        f.write_str(s)
    }
}

/// Records and logs the phase history of a run
#[derive(Debug)]
pub(crate) struct PhaseTracker {
    run_id: Uuid,
    history: Vec<RunPhase>,
}

impl PhaseTracker {
    pub(crate) fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            history: vec![RunPhase::Init],
        }
    }

    pub(crate) fn current(&self) -> RunPhase {
        self.history.last().copied().unwrap_or(RunPhase::Init)
    }

    /// Move to `next`; an illegal move is logged and forces `Aborted`
    pub(crate) fn advance(&mut self, next: RunPhase) {
        let from = self.current();
        if from.can_transition_to(next) {
            info!(run_id = %self.run_id, %from, to = %next, "Run phase transition");
            self.history.push(next);
        } else {
            error!(run_id = %self.run_id, %from, to = %next, "Illegal run phase transition");
            if !from.is_terminal() {
                self.history.push(RunPhase::Aborted);
            }
        }
    }

    pub(crate) fn into_history(self) -> Vec<RunPhase> {
        self.history
    }
}

/// Terminal status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Complete,
    Aborted,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Complete => f.write_str("COMPLETE"),
            RunStatus::Aborted => f.write_str("ABORTED"),
        }
    }
}

/// A stage that reported failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: String,
    pub error: StageError,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.error)
    }
}

/// Result of one pipeline run
///
/// On abort, `failures` holds every failing parallel member or the single
/// failing chain stage, and `state` holds whatever was merged before the abort.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub state: StateSnapshot,
    pub failures: Vec<StageFailure>,
    pub phases: Vec<RunPhase>,
}

impl PipelineOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Complete
    }

    /// Names of the failing stages, in graph order
    pub fn failed_stages(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.stage.as_str()).collect()
    }

    /// First failing stage, if any
    pub fn failed_stage(&self) -> Option<&str> {
        self.failures.first().map(|f| f.stage.as_str())
    }
}
