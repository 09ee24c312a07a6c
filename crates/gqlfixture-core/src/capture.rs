//! Values captured from setup responses.

use crate::executor::Variables;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// Captured values keyed by captor name.
///
/// Each name is written once; the parse phase rejects duplicate captor
/// names across a sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CaptureStore {
    values: BTreeMap<String, Value>,
}

impl CaptureStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value captured under `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Decodes the value captured under `name` into `T`.
    ///
    /// Returns `None` when nothing was captured under that name.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Option<serde_json::Result<T>> {
        self.values
            .get(name)
            .map(|value| serde_json::from_value(value.clone()))
    }

    /// Returns true if a value was captured under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of captured values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates captured values in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Stores a fixture's captures together.
    pub(crate) fn extend(&mut self, captures: Vec<(String, Value)>) {
        for (name, value) in captures {
            debug_assert!(!self.values.contains_key(&name), "capture {name} written twice");
            self.values.insert(name, value);
        }
    }

    /// Builds the variables for a template from captured values.
    ///
    /// Returns `Ok(None)` when `names` is empty, and the first missing name
    /// as the error.
    pub fn variables(&self, names: &[String]) -> Result<Option<Variables>, String> {
        if names.is_empty() {
            return Ok(None);
        }

        let mut variables = Variables::new();
        for name in names {
            let value = self.values.get(name).ok_or_else(|| name.clone())?;
            variables.insert(name.clone(), value.clone());
        }
        Ok(Some(variables))
    }
}
