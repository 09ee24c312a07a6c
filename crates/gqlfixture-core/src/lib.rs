//! # gqlfixture-core
//!
//! Fixture sequences for GraphQL-backed test suites.
//!
//! A fixture is a setup mutation, an optional set of captors that pull
//! values out of the setup response by JSON Pointer, and an optional
//! teardown mutation. A [`FixtureSequence`] validates an ordered list of
//! fixtures, runs the setups in order while collecting captured values,
//! and later runs the teardowns in reverse order for every fixture whose
//! setup completed.
//!
//! Requests go through the [`RequestExecutor`] trait, so the sequence never
//! knows about HTTP. The `gqlfixture-http` crate supplies a real client and
//! [`testing::ScriptedExecutor`] supplies a scripted one.

pub mod capture;
pub mod config;
pub mod error;
pub mod executor;
pub mod fixture;
pub mod ledger;
pub mod path;
pub mod sequence;
pub mod template;
pub mod testing;
pub mod validate;

pub use capture::CaptureStore;
pub use config::{ConfigError, EndpointConfig, FixtureFile, ReadinessConfig};
pub use error::{FixtureError, FixtureResult};
pub use executor::{ExecuteError, RequestExecutor, Variables, check_response};
pub use fixture::{Fixture, Stage};
pub use ledger::{Ledger, LogEntry, Outcome};
pub use path::PathError;
pub use sequence::{FixtureSequence, Phase};
pub use template::TemplateSyntaxError;
pub use validate::{ValidationError, ValidationErrors};
