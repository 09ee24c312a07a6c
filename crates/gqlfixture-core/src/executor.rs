//! The request capability fixtures are executed through.

use async_trait::async_trait;
use serde_json::{Map, Value};

/// Variables sent alongside a template, keyed by GraphQL variable name.
pub type Variables = Map<String, Value>;

/// Underlying cause of a transport failure, kept for downcasting.
pub type TransportSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A request that did not produce a usable response.
///
/// Transport failures and GraphQL-level errors are both fatal to the step
/// that issued the request.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// The request could not be sent or the connection failed. The source
    /// is the executor's own error, e.g. a `reqwest::Error`.
    #[error("request failed: {0}")]
    Transport(#[source] TransportSource),

    /// The endpoint answered with a non-success status.
    #[error("bad response status code: {status} body: {body:?}")]
    Status { status: u16, body: String },

    /// The response body was not JSON.
    #[error("response is not json: {0}")]
    Decode(String),

    /// The response carried a GraphQL `errors` member.
    #[error("graphql response contains error: {0}")]
    Protocol(Value),
}

/// Sends a template with its variables and returns the parsed response.
///
/// Production code uses the HTTP client in `gqlfixture-http`; tests can
/// provide [`crate::testing::ScriptedExecutor`].
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Executes `query`. `variables` is `None` when the template declares none.
    async fn execute(
        &self,
        query: &str,
        variables: Option<&Variables>,
    ) -> Result<Value, ExecuteError>;
}

impl ExecuteError {
    /// Wraps an executor-specific failure as a transport error.
    pub fn transport(source: impl Into<TransportSource>) -> Self {
        ExecuteError::Transport(source.into())
    }
}

/// Rejects a GraphQL response envelope that reports errors.
///
/// Any `errors` member counts, whatever its shape, so executors agree on
/// what a failed step looks like.
pub fn check_response(body: Value) -> Result<Value, ExecuteError> {
    match body.get("errors") {
        Some(errors) => Err(ExecuteError::Protocol(errors.clone())),
        None => Ok(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_response_passes() {
        let body = json!({ "data": { "insert_abc": { "affected_rows": 1 } } });
        assert_eq!(check_response(body.clone()).unwrap(), body);
    }

    #[test]
    fn test_errors_member_is_protocol_error() {
        let body = json!({ "errors": [{ "message": "field not found" }], "data": null });

        let err = check_response(body).unwrap_err();

        assert!(matches!(err, ExecuteError::Protocol(_)));
        assert_eq!(
            err.to_string(),
            r#"graphql response contains error: [{"message":"field not found"}]"#
        );
    }

    #[test]
    fn test_non_array_errors_still_fail() {
        let body = json!({ "errors": { "extensions": {} } });
        assert!(check_response(body).is_err());
    }

    #[test]
    fn test_transport_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");

        let err = ExecuteError::transport(io);

        assert_eq!(err.to_string(), "request failed: connection refused");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(
            source.downcast_ref::<std::io::Error>().map(std::io::Error::kind),
            Some(std::io::ErrorKind::ConnectionRefused)
        );
    }
}
