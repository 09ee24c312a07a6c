//! Errors returned by a fixture sequence.

use crate::executor::ExecuteError;
use crate::fixture::Stage;
use crate::path::PathError;
use crate::validate::ValidationErrors;

/// Result alias for fixture sequence operations.
pub type FixtureResult<T> = Result<T, FixtureError>;

/// Errors from running or reading a [`crate::FixtureSequence`].
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    /// The sequence failed validation; nothing was executed.
    #[error("parse error: {0}")]
    Invalid(#[from] ValidationErrors),

    /// Setup or teardown was already attempted on this sequence.
    #[error("{stage} has already been attempted{}", progress_suffix(.progress))]
    AlreadyAttempted {
        stage: Stage,
        progress: Option<usize>,
    },

    /// Teardown was invoked before setup.
    #[error("setup hasn't been attempted")]
    SetupNotAttempted,

    /// A setup or teardown request failed.
    #[error("fixture[{index}].{stage} failed: {source}")]
    Request {
        index: usize,
        stage: Stage,
        #[source]
        source: ExecuteError,
    },

    /// A captor did not resolve against a successful setup response.
    #[error("fixture[{index}].captors failed: {captor} ({path}) not found: {source}")]
    Capture {
        index: usize,
        captor: String,
        path: String,
        #[source]
        source: PathError,
    },

    /// A variable that passed validation was absent at execution time.
    ///
    /// This is a bug in validation, not a problem with the fixtures.
    #[error("internal error: fixture[{index}].{stage} variable {name} missing from captured values")]
    MissingVariable {
        index: usize,
        stage: Stage,
        name: String,
    },

    /// A teardown variable belongs to a fixture whose captors failed to resolve.
    #[error("fixture[{index}].{stage}: variable {name} was not captured because fixture[{owner}].captors failed")]
    Uncaptured {
        index: usize,
        stage: Stage,
        name: String,
        owner: usize,
    },

    /// Nothing has been captured because setup never ran.
    #[error("captured is empty: setup hasn't been attempted")]
    NothingCaptured,

    /// No value was captured under the name.
    #[error("captured value {0} not found")]
    CaptureNotFound(String),

    /// A captured value does not decode into the requested type.
    #[error("captured value {name} does not match the requested shape: {source}")]
    ShapeMismatch {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

fn progress_suffix(progress: &Option<usize>) -> String {
    match progress {
        Some(index) => format!(" until fixture[{index}]"),
        None => " without completing any fixture".to_string(),
    }
}

impl FixtureError {
    /// Returns true if the error came from the request capability.
    pub fn is_request(&self) -> bool {
        matches!(self, FixtureError::Request { .. })
    }

    /// Returns true if the error is a once-only or ordering violation.
    pub fn is_state(&self) -> bool {
        matches!(
            self,
            FixtureError::AlreadyAttempted { .. } | FixtureError::SetupNotAttempted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_attempted_message() {
        let err = FixtureError::AlreadyAttempted {
            stage: Stage::Setup,
            progress: Some(1),
        };
        assert_eq!(err.to_string(), "setup has already been attempted until fixture[1]");
        assert!(err.is_state());

        let err = FixtureError::AlreadyAttempted {
            stage: Stage::Teardown,
            progress: None,
        };
        assert_eq!(
            err.to_string(),
            "teardown has already been attempted without completing any fixture"
        );
    }

    #[test]
    fn test_request_message() {
        let err = FixtureError::Request {
            index: 1,
            stage: Stage::Setup,
            source: ExecuteError::transport("connection refused"),
        };
        assert_eq!(
            err.to_string(),
            "fixture[1].setup failed: request failed: connection refused"
        );
        assert!(err.is_request());
    }
}
