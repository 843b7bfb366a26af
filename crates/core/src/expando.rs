//! Generic, insertion-ordered records
//!
//! [`ExpandoRecord`] is the source side of every converter. Wrapped in a
//! [`SharedMap`] it becomes the backing store of wrapper-strategy records.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Serialize;

use crate::value::Value;

/// Shared, mutable name-to-value mapping
///
/// Every holder (the caller and any number of wrapper records) keeps the map
/// alive; there is no exclusive owner. The lock makes individual reads and
/// writes memory-safe. Callers that need a read-modify-write to be atomic
/// across holders must serialize it themselves.
pub type SharedMap = Arc<RwLock<ExpandoRecord>>;

/// Name-to-value record with dynamic fields
///
/// Iteration order is insertion order. Overwriting an existing key keeps its
/// original position; removing a key preserves the order of the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExpandoRecord {
    fields: IndexMap<String, Value>,
}

impl ExpandoRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    /// Insert or overwrite a field, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Remove a field, keeping the order of the remaining fields
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Move this record into a shared mapping for wrapper-strategy binding
    pub fn into_shared(self) -> SharedMap {
        Arc::new(RwLock::new(self))
    }

    /// Render as a JSON object, mainly for logging
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ExpandoRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for ExpandoRecord {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.fields
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}
