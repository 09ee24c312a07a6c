//! Test scenario definitions and execution.

use super::scripted::{RecordedRequest, Reply, ScriptedExecutor};
use crate::capture::CaptureStore;
use crate::error::FixtureError;
use crate::fixture::Fixture;
use crate::sequence::FixtureSequence;

/// A full setup-then-teardown run against scripted replies.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub fixtures: Vec<Fixture>,
    pub replies: Vec<Reply>,
    pub teardown: bool,
}

impl Scenario {
    /// Creates a new scenario that runs setup and teardown.
    pub fn new(name: impl Into<String>, fixtures: Vec<Fixture>) -> Self {
        Self {
            name: name.into(),
            fixtures,
            replies: Vec::new(),
            teardown: true,
        }
    }

    /// Sets the scripted replies.
    pub fn with_replies(mut self, replies: Vec<Reply>) -> Self {
        self.replies = replies;
        self
    }

    /// Skips teardown.
    pub fn without_teardown(mut self) -> Self {
        self.teardown = false;
        self
    }
}

/// Runs scenarios.
#[derive(Debug, Default)]
pub struct ScenarioRunner;

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new() -> Self {
        Self
    }

    /// Runs setup and, unless disabled, teardown. Teardown runs even when
    /// setup failed, as a test harness would.
    pub async fn run(&self, scenario: &Scenario) -> ExecutionTrace {
        let executor = ScriptedExecutor::new(scenario.replies.clone());
        let mut sequence = FixtureSequence::new(scenario.fixtures.clone());

        let setup = sequence.setup(&executor).await;
        let teardown = if scenario.teardown {
            Some(sequence.teardown(&executor).await)
        } else {
            None
        };

        ExecutionTrace {
            setup,
            teardown,
            requests: executor.requests(),
            logs: sequence.log_lines(),
            captured: sequence.captured().cloned(),
            setup_progress: sequence.setup_progress(),
            teardown_progress: sequence.teardown_progress(),
        }
    }
}

/// What happened during a scenario run.
#[derive(Debug)]
pub struct ExecutionTrace {
    pub setup: Result<(), FixtureError>,
    pub teardown: Option<Result<(), FixtureError>>,
    pub requests: Vec<RecordedRequest>,
    pub logs: Vec<String>,
    pub captured: Option<CaptureStore>,
    pub setup_progress: Option<usize>,
    pub teardown_progress: Option<usize>,
}

impl ExecutionTrace {
    /// Returns true if setup and any teardown both succeeded.
    pub fn succeeded(&self) -> bool {
        self.setup.is_ok() && self.teardown.as_ref().is_none_or(Result::is_ok)
    }

    /// Queries sent, in order.
    pub fn queries(&self) -> Vec<&str> {
        self.requests.iter().map(|r| r.query.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CREATE_A: &str = r#"mutation { insert(objects: { name: "a" }) { returning { id } } }"#;
    const DELETE_A: &str = "mutation ($a_id: Int!) { delete_a(where: { id: { _eq: $a_id } }) { affected_rows } }";
    const CREATE_B: &str =
        r#"mutation ($a_id: Int!) { insert_b(objects: { name: "b", a_id: $a_id }) { returning { id } } }"#;
    const DELETE_B: &str = "mutation ($b_id: Int!) { delete_b(where: { id: { _eq: $b_id } }) { affected_rows } }";

    fn parent_and_child() -> Vec<Fixture> {
        vec![
            Fixture::new(CREATE_A)
                .with_captor("a_id", "/data/insert/returning/0/id")
                .with_teardown(DELETE_A),
            Fixture::new(CREATE_B)
                .with_captor("b_id", "/data/insert_b/returning/0/id")
                .with_teardown(DELETE_B),
        ]
    }

    #[tokio::test]
    async fn test_parent_child_round_trip() {
        let scenario = Scenario::new("parent and child", parent_and_child()).with_replies(vec![
            Reply::Respond(json!({ "data": { "insert": { "returning": [{ "id": 5 }] } } })),
            Reply::Respond(json!({ "data": { "insert_b": { "returning": [{ "id": 9 }] } } })),
            Reply::Respond(json!({ "data": { "delete_b": { "affected_rows": 1 } } })),
            Reply::Respond(json!({ "data": { "delete_a": { "affected_rows": 1 } } })),
        ]);

        let trace = ScenarioRunner::new().run(&scenario).await;

        assert!(trace.succeeded());
        assert_eq!(trace.queries(), vec![CREATE_A, CREATE_B, DELETE_B, DELETE_A]);
        assert_eq!(
            trace.requests[1].variables.as_ref().and_then(|v| v.get("a_id")),
            Some(&json!(5))
        );
        let captured = trace.captured.unwrap();
        assert_eq!(captured.get("a_id"), Some(&json!(5)));
        assert_eq!(captured.get("b_id"), Some(&json!(9)));
        assert_eq!(trace.teardown_progress, Some(0));
    }

    #[tokio::test]
    async fn test_child_failure_still_cleans_up_parent() {
        let scenario = Scenario::new("child fails", parent_and_child()).with_replies(vec![
            Reply::Respond(json!({ "data": { "insert": { "returning": [{ "id": 5 }] } } })),
            Reply::Respond(json!({ "errors": [{ "message": "foreign key violation" }] })),
            Reply::Respond(json!({ "data": { "delete_a": { "affected_rows": 1 } } })),
        ]);

        let trace = ScenarioRunner::new().run(&scenario).await;

        assert!(trace.setup.is_err());
        assert_eq!(trace.setup_progress, Some(0));
        assert!(!trace.captured.as_ref().unwrap().contains("b_id"));
        assert_eq!(trace.queries(), vec![CREATE_A, CREATE_B, DELETE_A]);
        assert!(matches!(trace.teardown, Some(Ok(()))));
        assert_eq!(
            trace.logs,
            vec![
                "fixture[0].setup: completed",
                "fixture[0].captors: captured 1 value(s)",
                r#"fixture[1].setup failed: graphql response contains error: [{"message":"foreign key violation"}]"#,
                "fixture[0].teardown: completed",
            ]
        );
    }

    #[tokio::test]
    async fn test_without_teardown() {
        let scenario = Scenario::new("setup only", parent_and_child())
            .with_replies(vec![
                Reply::Respond(json!({ "data": { "insert": { "returning": [{ "id": 5 }] } } })),
                Reply::Respond(json!({ "data": { "insert_b": { "returning": [{ "id": 9 }] } } })),
            ])
            .without_teardown();

        let trace = ScenarioRunner::new().run(&scenario).await;

        assert!(trace.succeeded());
        assert!(trace.teardown.is_none());
        assert_eq!(trace.requests.len(), 2);
    }
}
