//! Fixture declarations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The part of a fixture an operation, log entry or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// The setup request.
    Setup,
    /// Extraction of captured values from the setup response.
    Captors,
    /// The teardown request.
    Teardown,
}

impl Stage {
    /// Returns the lowercase name used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Setup => "setup",
            Stage::Captors => "captors",
            Stage::Teardown => "teardown",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One unit of test data: how to create it, what to capture from the
/// creation response, and how to remove it again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    /// GraphQL sent to create the data. Usually a mutation.
    pub setup: String,

    /// Captor name to JSON pointer into the setup response.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub captors: BTreeMap<String, String>,

    /// GraphQL sent to remove the data. `None` if there is nothing to undo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teardown: Option<String>,

    #[serde(skip)]
    pub(crate) setup_variables: Vec<String>,

    #[serde(skip)]
    pub(crate) teardown_variables: Vec<String>,
}

impl Fixture {
    /// Creates a fixture with a setup template and nothing else.
    pub fn new(setup: impl Into<String>) -> Self {
        Self {
            setup: setup.into(),
            captors: BTreeMap::new(),
            teardown: None,
            setup_variables: Vec::new(),
            teardown_variables: Vec::new(),
        }
    }

    /// Adds a captor.
    pub fn with_captor(mut self, name: impl Into<String>, pointer: impl Into<String>) -> Self {
        self.captors.insert(name.into(), pointer.into());
        self
    }

    /// Sets the teardown template.
    pub fn with_teardown(mut self, teardown: impl Into<String>) -> Self {
        self.teardown = Some(teardown.into());
        self
    }

    /// Variables the setup template consumes. Empty until the sequence is parsed.
    pub fn setup_variables(&self) -> &[String] {
        &self.setup_variables
    }

    /// Variables the teardown template consumes. Empty until the sequence is parsed.
    pub fn teardown_variables(&self) -> &[String] {
        &self.teardown_variables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let fixture = Fixture::new("mutation { a }")
            .with_captor("a_id", "/data/a/id")
            .with_teardown("mutation ($a_id: Int!) { b(id: $a_id) }");

        assert_eq!(fixture.captors.get("a_id").map(String::as_str), Some("/data/a/id"));
        assert!(fixture.teardown.is_some());
        assert!(fixture.setup_variables().is_empty());
    }

    #[test]
    fn test_deserialize_defaults() {
        let yaml = r#"
setup: "mutation { a }"
"#;
        let fixture: Fixture = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(fixture, Fixture::new("mutation { a }"));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Setup.to_string(), "setup");
        assert_eq!(Stage::Captors.to_string(), "captors");
        assert_eq!(Stage::Teardown.to_string(), "teardown");
    }
}
