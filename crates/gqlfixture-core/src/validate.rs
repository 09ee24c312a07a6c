//! Parse-phase validation of a fixture sequence.
//!
//! Checks every template's syntax, that each template only consumes
//! captures that exist by the time it runs, and that captor names are unique
//! across the sequence. Every problem is collected; validation never stops at
//! the first one.

use crate::fixture::{Fixture, Stage};
use crate::path::{self, PathError};
use crate::template::{self, TemplateSyntaxError};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// One problem found while parsing a fixture sequence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A setup or teardown template does not parse.
    #[error("fixture[{index}].{stage}: is invalid. {source}")]
    Syntax {
        index: usize,
        stage: Stage,
        #[source]
        source: TemplateSyntaxError,
    },

    /// A template consumes captures not available when it runs.
    #[error("fixture[{index}].{stage}: captors not available: {}", .missing.join(", "))]
    MissingCaptures {
        index: usize,
        stage: Stage,
        missing: Vec<String>,
    },

    /// A captor name already declared by an earlier fixture.
    #[error("fixture[{index}].captors: duplicate captor name: {name} is already used by fixture[{first}]")]
    DuplicateCaptor {
        index: usize,
        name: String,
        first: usize,
    },

    /// A captor path that is not a JSON pointer.
    #[error("fixture[{index}].captors: {name} has an invalid path: {source}")]
    InvalidCaptorPath {
        index: usize,
        name: String,
        #[source]
        source: PathError,
    },
}

impl ValidationError {
    /// Index of the fixture the problem belongs to.
    pub fn index(&self) -> usize {
        match self {
            ValidationError::Syntax { index, .. }
            | ValidationError::MissingCaptures { index, .. }
            | ValidationError::DuplicateCaptor { index, .. }
            | ValidationError::InvalidCaptorPath { index, .. } => *index,
        }
    }
}

/// All problems found in a fixture sequence, in the order they were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// The individual problems.
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Number of problems.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a value produced by validation.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the problems.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [only] = self.0.as_slice() {
            return write!(f, "1 error occurred: {only}");
        }
        write!(f, "{} errors occurred:", self.0.len())?;
        for err in &self.0 {
            write!(f, "\n\t* {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Validates `fixtures` in order and records each template's variables on
/// its fixture.
///
/// Variables are recorded only for templates that passed every check.
pub fn validate(fixtures: &mut [Fixture]) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    // captor name -> index of the fixture declaring it
    let mut available: HashMap<String, usize> = HashMap::new();

    for (index, fixture) in fixtures.iter_mut().enumerate() {
        // Setup runs before its own captors exist, so check it first.
        if let Some(vars) = check_template(index, Stage::Setup, &fixture.setup, &available, &mut errors) {
            fixture.setup_variables = vars;
        }

        for (name, pointer) in &fixture.captors {
            if let Err(source) = path::validate(pointer) {
                errors.push(ValidationError::InvalidCaptorPath {
                    index,
                    name: name.clone(),
                    source,
                });
            }
            match available.get(name) {
                Some(&first) => errors.push(ValidationError::DuplicateCaptor {
                    index,
                    name: name.clone(),
                    first,
                }),
                None => {
                    available.insert(name.clone(), index);
                }
            }
        }

        if let Some(teardown) = &fixture.teardown {
            if let Some(vars) = check_template(index, Stage::Teardown, teardown, &available, &mut errors) {
                fixture.teardown_variables = vars;
            }
        }
    }

    debug!(
        fixtures = fixtures.len(),
        captors = available.len(),
        errors = errors.len(),
        "Fixture sequence validated"
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

fn check_template(
    index: usize,
    stage: Stage,
    template: &str,
    available: &HashMap<String, usize>,
    errors: &mut Vec<ValidationError>,
) -> Option<Vec<String>> {
    let variables = match template::analyze(template) {
        Ok(variables) => variables,
        Err(source) => {
            errors.push(ValidationError::Syntax { index, stage, source });
            return None;
        }
    };

    let missing: Vec<String> = variables
        .iter()
        .filter(|name| !available.contains_key(name.as_str()))
        .cloned()
        .collect();

    if missing.is_empty() {
        Some(variables)
    } else {
        errors.push(ValidationError::MissingCaptures { index, stage, missing });
        None
    }
}
