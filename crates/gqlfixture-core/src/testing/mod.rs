//! Testing utilities for deterministic fixture runs.

pub mod scenario;
pub mod scripted;

pub use scenario::{ExecutionTrace, Scenario, ScenarioRunner};
pub use scripted::{RecordedRequest, Reply, ScriptedExecutor};
