//! Generic key/value configuration bag.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

/// Thread-safe key/value bag passed through to adapters.
///
/// The entity core never requires specific keys; it only threads the bag
/// through [`crate::adapter::AdapterContext`] for adapters that need
/// backend-specific settings.
#[derive(Debug, Default)]
pub struct ConfigBag {
    values: RwLock<HashMap<String, Value>>,
}

impl ConfigBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any previous one.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.values
            .write()
            .expect("config lock poisoned")
            .insert(key.into(), value);
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .expect("config lock poisoned")
            .get(key)
            .cloned()
    }

    /// Get a string value by key.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(|v| v.as_str().map(|s| s.to_string()))
    }

    /// Remove a value, returning it if present.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.values
            .write()
            .expect("config lock poisoned")
            .remove(key)
    }
}
