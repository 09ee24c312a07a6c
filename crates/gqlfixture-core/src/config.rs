//! Fixture file loading.
//!
//! A fixture file is YAML (JSON also parses) naming the GraphQL endpoint and
//! the fixtures to run against it. Header values may reference environment
//! variables as `${NAME}` so secrets stay out of the file.

use crate::fixture::Fixture;
use crate::sequence::FixtureSequence;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env reference pattern is valid")
});

/// Errors loading a fixture file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("header {header} references unset environment variable {var}")]
    MissingEnv { header: String, var: String },

    #[error("fixture file has no endpoint configured")]
    NoEndpoint,
}

/// Top-level fixture file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureFile {
    /// Where to send requests. May be overridden on the command line.
    #[serde(default)]
    pub endpoint: Option<EndpointConfig>,

    /// Fixtures in setup order.
    #[serde(default)]
    pub fixtures: Vec<Fixture>,
}

/// GraphQL endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// GraphQL endpoint URL.
    pub url: String,

    /// Extra request headers, e.g. an admin secret.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Per-request timeout.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Wait for the endpoint to answer before running fixtures.
    #[serde(default)]
    pub readiness: Option<ReadinessConfig>,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_probe_query() -> String {
    "query { __typename }".to_string()
}

fn default_max_wait_seconds() -> u64 {
    120
}

fn default_interval_seconds() -> u64 {
    5
}

/// Readiness probe settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessConfig {
    /// Query sent to check the endpoint is up.
    #[serde(default = "default_probe_query")]
    pub query: String,

    /// Give up after this long.
    #[serde(default = "default_max_wait_seconds")]
    pub max_wait_seconds: u64,

    /// Pause between probes.
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            query: default_probe_query(),
            max_wait_seconds: default_max_wait_seconds(),
            interval_seconds: default_interval_seconds(),
        }
    }
}

impl ReadinessConfig {
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_seconds)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl EndpointConfig {
    /// Creates settings for `url` with defaults for everything else.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            timeout_seconds: default_timeout_seconds(),
            readiness: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Header values with `${NAME}` references replaced from the environment.
    pub fn resolved_headers(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        self.resolved_headers_with(|name| std::env::var(name).ok())
    }

    /// Like [`Self::resolved_headers`] with a custom variable lookup.
    pub fn resolved_headers_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<BTreeMap<String, String>, ConfigError> {
        let mut resolved = BTreeMap::new();

        for (header, value) in &self.headers {
            let mut out = String::with_capacity(value.len());
            let mut last = 0;
            for caps in ENV_REF.captures_iter(value) {
                let (Some(whole), Some(var)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let replacement = lookup(var.as_str()).ok_or_else(|| ConfigError::MissingEnv {
                    header: header.clone(),
                    var: var.as_str().to_string(),
                })?;
                out.push_str(&value[last..whole.start()]);
                out.push_str(&replacement);
                last = whole.end();
            }
            out.push_str(&value[last..]);
            resolved.insert(header.clone(), out);
        }

        Ok(resolved)
    }
}

impl FixtureFile {
    /// Loads a fixture file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parses fixture file content.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// The endpoint, or an error if none is configured.
    pub fn endpoint(&self) -> Result<&EndpointConfig, ConfigError> {
        self.endpoint.as_ref().ok_or(ConfigError::NoEndpoint)
    }

    /// Builds an unparsed sequence from the declared fixtures.
    pub fn into_sequence(self) -> FixtureSequence {
        FixtureSequence::new(self.fixtures)
    }
}
