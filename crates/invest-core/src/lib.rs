//! Core abstractions for invest-rs
//!
//! This crate defines the analysis state shared by a pipeline run and the
//! stage trait every unit of work implements.

pub mod error;
pub mod stage;
pub mod state;

pub use error::{Error, Result, StageError};
pub use stage::{Concurrency, Stage, StageDescriptor};
pub use state::{AnalysisState, StateSnapshot};
