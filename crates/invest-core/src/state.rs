//! Shared analysis state carried through a pipeline run
//!
//! [`AnalysisState`] is a run-scoped key-value record. The orchestrator owns it
//! for the whole run and lends it to one stage at a time; once the run is over
//! only a read-only [`StateSnapshot`] leaves the orchestrator.
//!
//! There is deliberately no removal operation: every key has exactly one
//! producing stage and, in the happy path, is written once.

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

use crate::{Error, Result, StageError};

/// Mutable key-value record for a single pipeline run
///
/// # Example
///
/// ```
/// use invest_core::AnalysisState;
/// use serde_json::json;
///
/// let mut state = AnalysisState::new().with("ticker", json!("AAPL"));
/// state.set("current_date", json!("January 02, 2026"));
///
/// assert!(state.has("ticker"));
/// assert_eq!(state.get_str("ticker"), Some("AAPL"));
///
/// let snapshot = state.snapshot();
/// assert_eq!(snapshot.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AnalysisState {
    data: BTreeMap<String, Value>,
}

impl AnalysisState {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value (builder form of [`set`](Self::set))
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.set(key, value);
        self
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Write a value
    ///
    /// Keys are expected to be written once per run; overwriting is allowed
    /// (a stage may be re-run by hand) but is logged.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if self.data.contains_key(&key) {
            warn!(key = %key, "Overwriting existing state key");
        }
        self.data.insert(key, value);
    }

    /// Check whether a key has been written
    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Take an immutable copy of the current contents
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            data: Arc::new(self.data.clone()),
        }
    }

    /// Get a string value
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Serialize a typed value into the state
    pub fn set_typed<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        let key = key.into();
        let json = serde_json::to_value(value).map_err(|source| Error::Serialization {
            key: key.clone(),
            source,
        })?;
        self.set(key, json);
        Ok(())
    }

    /// Deserialize a typed value from the state
    pub fn get_typed<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        decode(&self.data, key)
    }

    /// Get a non-blank string input or fail with a stage error
    ///
    /// Blank strings count as absent: an upstream stage that "succeeded" with
    /// empty output has not produced anything a downstream stage can use.
    pub fn require_str(&self, key: &str) -> std::result::Result<&str, StageError> {
        match self.get(key) {
            None | Some(Value::Null) => Err(StageError::MissingInput(key.to_string())),
            Some(Value::String(s)) if s.trim().is_empty() => {
                Err(StageError::MissingInput(key.to_string()))
            }
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(StageError::InvalidValue {
                key: key.to_string(),
                reason: format!("expected a string, found {}", type_name(other)),
            }),
        }
    }

    /// Get a required typed input or fail with a stage error
    pub fn require_typed<T: DeserializeOwned>(&self, key: &str) -> std::result::Result<T, StageError> {
        match self.get(key) {
            None | Some(Value::Null) => Err(StageError::MissingInput(key.to_string())),
            Some(_) => self
                .get_typed(key)?
                .ok_or_else(|| StageError::MissingInput(key.to_string())),
        }
    }

    /// Iterate over the keys currently present, in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Number of keys in the state
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the state is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Read-only copy of an [`AnalysisState`]
///
/// Cloning a snapshot is cheap; the contents are shared.
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    data: Arc<BTreeMap<String, Value>>,
}

impl StateSnapshot {
    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Check whether a key is present
    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Get a string value
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Deserialize a typed value
    pub fn get_typed<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        decode(&self.data, key)
    }

    /// Iterate over the keys, in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Render the snapshot as a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.data
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl Serialize for StateSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

fn decode<T: DeserializeOwned>(data: &BTreeMap<String, Value>, key: &str) -> Result<Option<T>> {
    match data.get(key) {
        None => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|source| Error::Serialization {
                key: key.to_string(),
                source,
            }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
