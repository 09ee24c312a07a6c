//! Scripted request executor.

use crate::executor::{ExecuteError, RequestExecutor, Variables, check_response};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// What the scripted executor does for one request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Answer with this body. A body with an `errors` member fails the
    /// request, the same way the HTTP client treats it.
    Respond(Value),
    /// Fail at the transport level with this message.
    Fail(String),
    /// Never answer. Used to exercise cancellation.
    Hang,
}

/// A request the executor received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub query: String,
    pub variables: Option<Variables>,
}

/// Executor that replays scripted replies in order and records requests.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedExecutor {
    /// Creates an executor with the given replies.
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates an executor that answers with each body in turn.
    pub fn responding(bodies: Vec<Value>) -> Self {
        Self::new(bodies.into_iter().map(Reply::Respond).collect())
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of scripted replies not used yet.
    pub fn remaining(&self) -> usize {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl RequestExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        query: &str,
        variables: Option<&Variables>,
    ) -> Result<Value, ExecuteError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                query: query.to_string(),
                variables: variables.cloned(),
            });

        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match reply {
            Some(Reply::Respond(body)) => check_response(body),
            Some(Reply::Fail(message)) => Err(ExecuteError::transport(message)),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(ExecuteError::transport("no scripted reply left")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let executor = ScriptedExecutor::new(vec![
            Reply::Respond(json!({ "data": { "a": 1 } })),
            Reply::Fail("connection refused".to_string()),
        ]);
        let mut vars = Variables::new();
        vars.insert("id".to_string(), json!(7));

        let first = executor.execute("query { a }", None).await.unwrap();
        let second = executor.execute("query ($id: Int) { b(id: $id) }", Some(&vars)).await;
        let third = executor.execute("query { c }", None).await;

        assert_eq!(first, json!({ "data": { "a": 1 } }));
        assert!(matches!(second, Err(ExecuteError::Transport(ref e)) if e.to_string() == "connection refused"));
        assert!(third.is_err());
        assert_eq!(executor.request_count(), 3);
        assert_eq!(executor.requests()[1].variables, Some(vars));
        assert_eq!(executor.remaining(), 0);
    }

    #[tokio::test]
    async fn test_errors_body_fails() {
        let executor = ScriptedExecutor::responding(vec![json!({ "errors": [{ "message": "boom" }] })]);

        let result = executor.execute("mutation { a }", None).await;

        assert!(matches!(result, Err(ExecuteError::Protocol(_))));
    }
}
