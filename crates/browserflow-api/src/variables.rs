//! In-memory flow variable store.
//!
//! Flows read and write named values while they run (scraped text, counters,
//! URLs built at runtime). The store lives for the lifetime of the server and
//! is shared through [`crate::AppState`].

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

/// Variable count used when none is configured.
pub const DEFAULT_MAX_VARIABLES: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariableError {
    #[error("Variable limit reached ({max} variables)")]
    LimitReached { max: usize },
}

/// Named JSON values shared between flow runs.
///
/// Holds at most `max_entries` names. Overwriting an existing name is
/// always allowed.
#[derive(Debug)]
pub struct FlowVariableStore {
    values: RwLock<HashMap<String, Value>>,
    max_entries: usize,
}

impl Default for FlowVariableStore {
    fn default() -> Self {
        Self::with_max_entries(DEFAULT_MAX_VARIABLES)
    }
}

impl FlowVariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            max_entries,
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub async fn get(&self, name: &str) -> Option<Value> {
        self.values.read().await.get(name).cloned()
    }

    /// Store `value` under `name`, returning the value it replaced.
    pub async fn set(
        &self,
        name: impl Into<String>,
        value: Value,
    ) -> Result<Option<Value>, VariableError> {
        let name = name.into();
        let mut values = self.values.write().await;
        if !values.contains_key(&name) && values.len() >= self.max_entries {
            return Err(VariableError::LimitReached {
                max: self.max_entries,
            });
        }
        Ok(values.insert(name, value))
    }

    pub async fn remove(&self, name: &str) -> Option<Value> {
        self.values.write().await.remove(name)
    }

    /// Snapshot of every variable, ordered by name.
    pub async fn list(&self) -> BTreeMap<String, Value> {
        self.values
            .read()
            .await
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Remove every variable, returning how many were dropped.
    pub async fn clear(&self) -> usize {
        let mut values = self.values.write().await;
        let count = values.len();
        values.clear();
        count
    }

    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}
