//! # gqlfixture-http
//!
//! HTTP transport for fixture sequences.
//!
//! [`GraphqlClient`] POSTs `{query, variables}` envelopes to a GraphQL
//! endpoint and implements [`gqlfixture_core::RequestExecutor`], so a
//! [`gqlfixture_core::FixtureSequence`] can run against a live server.
//! It can also poll the endpoint until it answers, which is useful when the
//! server is started alongside the test suite.

mod client;
mod error;

pub use client::GraphqlClient;
pub use error::{ClientError, ClientResult, ReadinessError};
