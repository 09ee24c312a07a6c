//! Audit trail of setup and teardown.
//!
//! Fixtures are not transactional: when a walk aborts, the ledger is what
//! tells a person (or a cleanup script) which steps already took effect.

use crate::fixture::Stage;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// What happened at one stage of one fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    /// The request succeeded.
    Completed,
    /// All captors resolved; carries how many values were stored.
    Captured(usize),
    /// The fixture declares nothing for this stage.
    NotExist,
    /// The stage failed; carries the reason.
    Failed(String),
}

/// A ledger record.
///
/// Renders as the line format used by [`Ledger::lines`]:
/// ```text
/// fixture[0].setup: completed
/// fixture[0].captors: captured 2 value(s)
/// fixture[1].setup failed: graphql response contains error: [...]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// When the entry was recorded.
    pub ts: DateTime<Utc>,
    /// Fixture index.
    pub fixture: usize,
    /// Stage of the fixture.
    pub stage: Stage,
    /// What happened.
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl LogEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(fixture: usize, stage: Stage, outcome: Outcome) -> Self {
        Self {
            ts: Utc::now(),
            fixture,
            stage,
            outcome,
        }
    }

    /// Returns true for a failure entry.
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fixture, stage) = (self.fixture, self.stage);
        match &self.outcome {
            Outcome::Completed => write!(f, "fixture[{fixture}].{stage}: completed"),
            Outcome::Captured(n) => write!(f, "fixture[{fixture}].{stage}: captured {n} value(s)"),
            Outcome::NotExist => write!(f, "fixture[{fixture}].{stage}: not exist"),
            Outcome::Failed(reason) => write!(f, "fixture[{fixture}].{stage} failed: {reason}"),
        }
    }
}

/// Append-only list of [`LogEntry`].
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: Vec<LogEntry>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&mut self, fixture: usize, stage: Stage, outcome: Outcome) {
        let entry = LogEntry::new(fixture, stage, outcome);
        debug!(entry = %entry, "Ledger entry recorded");
        self.entries.push(entry);
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// All entries rendered as lines.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}
