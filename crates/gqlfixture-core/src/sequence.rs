//! Fixture sequence orchestration.
//!
//! A [`FixtureSequence`] is parsed once, set up once and torn down once.
//! Setup walks the fixtures forward, feeding captured values into later
//! templates; teardown walks back from the last fixture that was set up.
//! Neither walk is transactional: a failure stops the walk and leaves earlier
//! side effects in place, with the ledger and progress markers recording how
//! far it got.

use crate::capture::CaptureStore;
use crate::error::{FixtureError, FixtureResult};
use crate::executor::{RequestExecutor, Variables};
use crate::fixture::{Fixture, Stage};
use crate::ledger::{Ledger, LogEntry, Outcome};
use crate::path;
use crate::validate::{self, ValidationErrors};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Where a sequence is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Not validated yet.
    Unparsed,
    /// Validated without problems; setup may run.
    Ready,
    /// Validation found problems; setup will refuse to run.
    Invalid(ValidationErrors),
    /// Setup ran, possibly partially. `setup` is the last fixture whose
    /// setup request succeeded.
    SetupAttempted { setup: Option<usize> },
    /// Teardown ran, possibly partially. `teardown` is the last fixture whose
    /// teardown request succeeded.
    TeardownAttempted {
        setup: Option<usize>,
        teardown: Option<usize>,
    },
}

/// An ordered list of fixtures and the state of running them.
#[derive(Debug)]
pub struct FixtureSequence {
    fixtures: Vec<Fixture>,
    phase: Phase,
    captured: Option<CaptureStore>,
    ledger: Ledger,
}

impl FixtureSequence {
    /// Creates an unparsed sequence.
    pub fn new(fixtures: Vec<Fixture>) -> Self {
        Self {
            fixtures,
            phase: Phase::Unparsed,
            captured: None,
            ledger: Ledger::new(),
        }
    }

    /// The fixtures, in setup order.
    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Returns true once the sequence has been validated.
    pub fn is_parsed(&self) -> bool {
        !matches!(self.phase, Phase::Unparsed)
    }

    /// Validates the sequence. Does nothing if it was already validated.
    pub fn parse(&mut self) {
        if self.is_parsed() {
            return;
        }

        self.phase = match validate::validate(&mut self.fixtures) {
            Ok(()) => Phase::Ready,
            Err(errors) => {
                warn!(errors = errors.len(), "Fixture sequence failed validation");
                Phase::Invalid(errors)
            }
        };
    }

    /// Validates the sequence if needed and returns the validation outcome.
    pub fn parse_result(&mut self) -> Result<(), ValidationErrors> {
        self.parse();
        match &self.phase {
            Phase::Invalid(errors) => Err(errors.clone()),
            _ => Ok(()),
        }
    }

    /// Runs every fixture's setup in order, capturing values as it goes.
    ///
    /// Parses first if needed. Stops at the first failing request or captor;
    /// fixtures set up before the failure stay set up. May only be called
    /// once, whatever the outcome.
    pub async fn setup(&mut self, executor: &dyn RequestExecutor) -> FixtureResult<()> {
        self.parse();
        match &self.phase {
            Phase::Unparsed | Phase::Ready => {}
            Phase::Invalid(errors) => return Err(FixtureError::Invalid(errors.clone())),
            Phase::SetupAttempted { setup } | Phase::TeardownAttempted { setup, .. } => {
                return Err(FixtureError::AlreadyAttempted {
                    stage: Stage::Setup,
                    progress: *setup,
                });
            }
        }

        let Self {
            fixtures,
            phase,
            captured,
            ledger,
        } = self;
        let fixtures: &[Fixture] = fixtures;
        *phase = Phase::SetupAttempted { setup: None };
        let store = captured.insert(CaptureStore::new());

        info!(fixtures = fixtures.len(), "Starting fixture setup");

        for (index, fixture) in fixtures.iter().enumerate() {
            let variables = compose(fixtures, store, ledger, index, Stage::Setup, &fixture.setup_variables)?;

            debug!(fixture = index, "Sending setup request");
            let response = match executor.execute(&fixture.setup, variables.as_ref()).await {
                Ok(response) => response,
                Err(source) => {
                    warn!(fixture = index, error = %source, "Fixture setup failed");
                    ledger.record(index, Stage::Setup, Outcome::Failed(source.to_string()));
                    return Err(FixtureError::Request {
                        index,
                        stage: Stage::Setup,
                        source,
                    });
                }
            };

            // The data exists from here on, so teardown must start at least here.
            *phase = Phase::SetupAttempted { setup: Some(index) };
            ledger.record(index, Stage::Setup, Outcome::Completed);
            info!(fixture = index, "Fixture setup completed");

            if fixture.captors.is_empty() {
                ledger.record(index, Stage::Captors, Outcome::NotExist);
                continue;
            }

            let captures = extract(ledger, index, fixture, &response)?;
            let count = captures.len();
            store.extend(captures);
            ledger.record(index, Stage::Captors, Outcome::Captured(count));
            debug!(fixture = index, count, "Captured values");
        }

        info!("Fixture setup finished");
        Ok(())
    }

    /// Runs teardown in reverse order, from the last fixture that was set up
    /// down to the first.
    ///
    /// Fixtures without a teardown template are skipped. Stops at the first
    /// failure. Requires a prior setup attempt and may only be called once.
    pub async fn teardown(&mut self, executor: &dyn RequestExecutor) -> FixtureResult<()> {
        let setup_progress = match &self.phase {
            Phase::SetupAttempted { setup } => *setup,
            Phase::TeardownAttempted { teardown, .. } => {
                return Err(FixtureError::AlreadyAttempted {
                    stage: Stage::Teardown,
                    progress: *teardown,
                });
            }
            Phase::Unparsed | Phase::Ready | Phase::Invalid(_) => {
                return Err(FixtureError::SetupNotAttempted);
            }
        };

        let Self {
            fixtures,
            phase,
            captured,
            ledger,
        } = self;
        let fixtures: &[Fixture] = fixtures;
        *phase = Phase::TeardownAttempted {
            setup: setup_progress,
            teardown: None,
        };

        let Some(last) = setup_progress else {
            info!("No fixture was set up, nothing to tear down");
            return Ok(());
        };
        let store = captured.get_or_insert_with(CaptureStore::new);

        info!(from = last, "Starting fixture teardown");

        for index in (0..=last).rev() {
            let fixture = &fixtures[index];
            let Some(template) = &fixture.teardown else {
                ledger.record(index, Stage::Teardown, Outcome::NotExist);
                continue;
            };

            let variables = compose(
                fixtures,
                store,
                ledger,
                index,
                Stage::Teardown,
                &fixture.teardown_variables,
            )?;

            debug!(fixture = index, "Sending teardown request");
            if let Err(source) = executor.execute(template, variables.as_ref()).await {
                warn!(fixture = index, error = %source, "Fixture teardown failed");
                ledger.record(index, Stage::Teardown, Outcome::Failed(source.to_string()));
                return Err(FixtureError::Request {
                    index,
                    stage: Stage::Teardown,
                    source,
                });
            }

            *phase = Phase::TeardownAttempted {
                setup: setup_progress,
                teardown: Some(index),
            };
            ledger.record(index, Stage::Teardown, Outcome::Completed);
            info!(fixture = index, "Fixture teardown completed");
        }

        info!("Fixture teardown finished");
        Ok(())
    }

    /// Returns the value captured under `name`.
    pub fn get(&self, name: &str) -> FixtureResult<&Value> {
        let store = self.captured.as_ref().ok_or(FixtureError::NothingCaptured)?;
        store
            .get(name)
            .ok_or_else(|| FixtureError::CaptureNotFound(name.to_string()))
    }

    /// Decodes the value captured under `name` into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> FixtureResult<T> {
        let value = self.get(name)?;
        serde_json::from_value(value.clone()).map_err(|source| FixtureError::ShapeMismatch {
            name: name.to_string(),
            source,
        })
    }

    /// All captured values, or `None` if setup never ran.
    pub fn captured(&self) -> Option<&CaptureStore> {
        self.captured.as_ref()
    }

    /// The audit trail of setup and teardown.
    pub fn logs(&self) -> &[LogEntry] {
        self.ledger.entries()
    }

    /// The audit trail rendered as lines.
    pub fn log_lines(&self) -> Vec<String> {
        self.ledger.lines()
    }

    /// Last fixture whose setup request succeeded.
    ///
    /// `None` before setup and when setup stalled on the first fixture;
    /// [`Self::phase`] tells the two apart.
    pub fn setup_progress(&self) -> Option<usize> {
        match self.phase {
            Phase::SetupAttempted { setup } | Phase::TeardownAttempted { setup, .. } => setup,
            Phase::Unparsed | Phase::Ready | Phase::Invalid(_) => None,
        }
    }

    /// Last fixture whose teardown request succeeded.
    pub fn teardown_progress(&self) -> Option<usize> {
        match self.phase {
            Phase::TeardownAttempted { teardown, .. } => teardown,
            _ => None,
        }
    }
}

/// Looks up a template's variables in the capture store.
fn compose(
    fixtures: &[Fixture],
    store: &CaptureStore,
    ledger: &mut Ledger,
    index: usize,
    stage: Stage,
    names: &[String],
) -> FixtureResult<Option<Variables>> {
    store.variables(names).map_err(|name| {
        // A captor that exists at or before this fixture but holds nothing
        // means that fixture's extraction failed; anything else slipped past
        // validation.
        match fixtures.iter().position(|f| f.captors.contains_key(&name)) {
            Some(owner) if owner <= index => {
                let reason = format!(
                    "variable {name} was not captured because fixture[{owner}].captors failed"
                );
                ledger.record(index, stage, Outcome::Failed(reason));
                FixtureError::Uncaptured {
                    index,
                    stage,
                    name,
                    owner,
                }
            }
            _ => {
                error!(fixture = index, %stage, variable = %name, "Validated variable missing from captured values");
                ledger.record(
                    index,
                    stage,
                    Outcome::Failed(format!("variable {name} missing from captured values")),
                );
                FixtureError::MissingVariable { index, stage, name }
            }
        }
    })
}

/// Resolves all of a fixture's captors, or none of them.
fn extract(
    ledger: &mut Ledger,
    index: usize,
    fixture: &Fixture,
    response: &Value,
) -> FixtureResult<Vec<(String, Value)>> {
    let mut captures = Vec::with_capacity(fixture.captors.len());

    for (captor, pointer) in &fixture.captors {
        match path::resolve(response, pointer) {
            Ok(value) => captures.push((captor.clone(), value.clone())),
            Err(source) => {
                warn!(fixture = index, captor = %captor, path = %pointer, error = %source, "Captor did not resolve");
                ledger.record(
                    index,
                    Stage::Captors,
                    Outcome::Failed(format!("{captor} ({pointer}) not found: {source}")),
                );
                return Err(FixtureError::Capture {
                    index,
                    captor: captor.clone(),
                    path: pointer.clone(),
                    source,
                });
            }
        }
    }

    Ok(captures)
}
