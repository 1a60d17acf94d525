//! Per-item enrichment state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::Value;

use crate::errors::StepError;

/// An object travelling through the pipeline with the results its steps have
/// produced so far.
///
/// Results live behind a mutex so that the concurrent steps of one stage can
/// write to the same item. Steps of one stage are expected to write disjoint
/// keys.
#[derive(Debug)]
pub struct PipelineItem<T> {
    object: T,
    results: Mutex<HashMap<String, Value>>,
    failed_steps: AtomicUsize,
}

impl<T> PipelineItem<T> {
    pub fn new(object: T) -> Self {
        Self {
            object,
            results: Mutex::new(HashMap::new()),
            failed_steps: AtomicUsize::new(0),
        }
    }

    /// The object being enriched.
    pub fn object(&self) -> &T {
        &self.object
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `value` under `key`, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.lock().insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// The value under `key` if it is a non-empty string.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.lock()
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// The value under `key` if it is an integer.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.lock().get(key).and_then(Value::as_i64)
    }

    /// Flatten `source` into the results: every top-level field of its JSON
    /// form becomes a result key. Returns the number of keys written.
    pub fn merge_into_results<S: Serialize + ?Sized>(&self, source: &S) -> Result<usize, StepError> {
        let fields = match serde_json::to_value(source) {
            Ok(Value::Object(fields)) => fields,
            Ok(other) => {
                return Err(StepError::merge(format!(
                    "expected an object, got {}",
                    json_kind(&other)
                )))
            }
            Err(e) => return Err(StepError::merge(e.to_string())),
        };

        let count = fields.len();
        self.lock().extend(fields);
        Ok(count)
    }

    /// A snapshot of the current results.
    pub fn results(&self) -> HashMap<String, Value> {
        self.lock().clone()
    }

    /// Note that one of the item's steps failed.
    pub fn record_failure(&self) {
        self.failed_steps.fetch_add(1, Ordering::Relaxed);
    }

    /// Steps that failed on this item so far.
    pub fn failed_steps(&self) -> usize {
        self.failed_steps.load(Ordering::Relaxed)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
