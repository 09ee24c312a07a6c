use std::time::Duration;

use gqlfixture_core::ConfigError;

/// Errors building a [`crate::GraphqlClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(String),

    /// A configured header name or value is not valid HTTP.
    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// Endpoint settings could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The endpoint did not answer successfully within the allowed time.
#[derive(Debug, thiserror::Error)]
pub enum ReadinessError {
    #[error("endpoint not ready after {waited:?}: {last_error}")]
    TimedOut { waited: Duration, last_error: String },
}

/// Result type alias for client construction.
pub type ClientResult<T> = Result<T, ClientError>;
