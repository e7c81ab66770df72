//! Error types for invest-core

use thiserror::Error;

/// Result type alias for invest-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for state and snapshot operations
#[derive(Error, Debug)]
pub enum Error {
    /// A value could not be converted to or from its JSON form
    #[error("Serialization failed for `{key}`: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Why a stage reported failure
///
/// Stages never propagate collaborator errors past their own boundary; every
/// failure is folded into one of these variants and handed to the orchestrator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// A required input key is absent (or empty) in the analysis state
    #[error("missing required input `{0}`")]
    MissingInput(String),

    /// A key is present but does not have the expected shape
    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },

    /// An external service or provider failed
    #[error("collaborator failed: {0}")]
    Collaborator(String),

    /// The stage task died before reporting
    #[error("stage aborted unexpectedly: {0}")]
    Panicked(String),
}

impl StageError {
    /// Wrap any displayable collaborator error
    pub fn collaborator(err: impl std::fmt::Display) -> Self {
        Self::Collaborator(err.to_string())
    }
}

impl From<Error> for StageError {
    fn from(err: Error) -> Self {
        let Error::Serialization { key, source } = err;
        StageError::InvalidValue {
            key,
            reason: source.to_string(),
        }
    }
}
