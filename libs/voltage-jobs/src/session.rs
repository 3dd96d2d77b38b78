//! Shared run session
//!
//! Open key/value context threaded through every job of a run. The engine
//! only owns the `results` key; everything else belongs to the caller's
//! conditions and actions.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Session key holding the ordered job results
pub const RESULTS_KEY: &str = "results";

/// Mutable session shared by all jobs of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session(Map<String, Value>);

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recorded `{job, return}` entries in execution order
    pub fn results(&self) -> &[Value] {
        match self.0.get(RESULTS_KEY) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Append a job result, creating the `results` list when needed
    pub fn push_result(&mut self, job: &str, result: Value) {
        let entry = json!({ "job": job, "return": result });
        if let Some(Value::Array(items)) = self.0.get_mut(RESULTS_KEY) {
            items.push(entry);
            return;
        }

        if let Some(other) = self.0.get(RESULTS_KEY) {
            tracing::warn!("Session results not a list ({}), resetting", other);
        }
        self.0
            .insert(RESULTS_KEY.to_string(), Value::Array(vec![entry]));
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Session {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Session> for Value {
    fn from(session: Session) -> Self {
        Value::Object(session.0)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Session {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
