//! JSON pointer resolution against response documents.
//!
//! Captors address values in a setup response with RFC 6901 pointers such
//! as `/data/insert_abc/returning/0/id`. Array segments must be canonical
//! decimal indices; nothing is coerced.

use serde_json::Value;

/// Why a pointer failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The pointer is empty or does not start with `/`.
    #[error("path must begin with '/': {0:?}")]
    NotAPointer(String),

    /// A `~` escape other than `~0` or `~1`.
    #[error("invalid escape in path segment '{index}': {segment:?}")]
    InvalidEscape { index: usize, segment: String },

    /// An object did not contain the requested member.
    #[error("failed to resolve path segment '{index}': field '{segment}' was not found")]
    FieldNotFound { index: usize, segment: String },

    /// An array was addressed with something that is not an index.
    #[error(
        "failed to resolve path segment '{index}': found array but segment value '{segment}' could not be parsed into array index"
    )]
    InvalidIndex { index: usize, segment: String },

    /// An array index past the end.
    #[error(
        "failed to resolve path segment '{index}': index {position} is out of bounds for array of length {len}"
    )]
    IndexOutOfBounds {
        index: usize,
        position: usize,
        len: usize,
    },

    /// A scalar was reached before the pointer was exhausted.
    #[error("failed to resolve path segment '{index}': found {kind} where an object or array was expected")]
    NotAContainer { index: usize, kind: &'static str },
}

/// Splits a pointer into unescaped reference tokens.
fn segments(pointer: &str) -> Result<Vec<String>, PathError> {
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(PathError::NotAPointer(pointer.to_string()));
    };

    rest.split('/')
        .enumerate()
        .map(|(index, raw)| unescape(raw).ok_or_else(|| PathError::InvalidEscape {
            index,
            segment: raw.to_string(),
        }))
        .collect()
}

fn unescape(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Parses an array index, accepting only `0` or digits without a leading zero.
fn array_index(segment: &str) -> Option<usize> {
    let canonical = segment == "0"
        || (!segment.is_empty()
            && !segment.starts_with('0')
            && segment.bytes().all(|b| b.is_ascii_digit()));
    if canonical { segment.parse().ok() } else { None }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Checks that `pointer` is syntactically a JSON pointer without resolving it.
pub fn validate(pointer: &str) -> Result<(), PathError> {
    segments(pointer).map(|_| ())
}

/// Resolves `pointer` against `document`.
pub fn resolve<'a>(document: &'a Value, pointer: &str) -> Result<&'a Value, PathError> {
    let mut current = document;

    for (index, segment) in segments(pointer)?.into_iter().enumerate() {
        current = match current {
            Value::Object(map) => map
                .get(&segment)
                .ok_or(PathError::FieldNotFound { index, segment })?,
            Value::Array(items) => {
                let position =
                    array_index(&segment).ok_or(PathError::InvalidIndex { index, segment })?;
                items.get(position).ok_or(PathError::IndexOutOfBounds {
                    index,
                    position,
                    len: items.len(),
                })?
            }
            other => {
                return Err(PathError::NotAContainer {
                    index,
                    kind: kind_of(other),
                });
            }
        };
    }

    Ok(current)
}
