//! Decides whether a single response is a success.
//!
//! A response only counts as a success when it has a 2xx status code, a body that
//! parses as JSON, and a non-empty `selections` array at the top level of that JSON.
//! Everything else is a [`Failure`], with a reason suitable for Goose's error summary.

use serde_json::Value;
use std::fmt;

/// Number of characters of the response body included in failure reasons.
pub const BODY_SAMPLE_CHARS: usize = 300;

/// The name of the field that must hold a non-empty array.
pub const SELECTIONS_FIELD: &str = "selections";

/// The outcome of validating one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failure(Failure),
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success)
    }

    /// Returns `true` only for failures caused by a body that is not JSON.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Verdict::Failure(failure) if failure.is_parse_failure())
    }
}

/// Why a response was not a success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The server returned a status code outside of `200..300`.
    Status(u16),
    /// The body could not be parsed as JSON.
    MalformedJson {
        /// The start of the response body.
        sample: String,
    },
    /// The body was JSON, but `selections` was missing, not an array, or empty.
    NoSelections {
        /// The start of the response body.
        sample: String,
    },
}

impl Failure {
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Failure::MalformedJson { .. })
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Failure::Status(status_code) => write!(f, "Non-2xx status: {}", status_code),
            Failure::MalformedJson { sample } => {
                write!(f, "JSON parse failed. Body sample: {}", sample)
            }
            Failure::NoSelections { sample } => {
                write!(f, "No selections (or empty). Body sample: {}", sample)
            }
        }
    }
}

/// What was found where the `selections` array should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionsField {
    /// There is no `selections` field, or the document is not a JSON object.
    Absent,
    /// `selections` exists but is not an array.
    WrongType,
    /// `selections` is an empty array.
    Empty,
    /// `selections` is an array with this many elements.
    NonEmpty(usize),
}

/// Inspect the `selections` field of a parsed JSON document.
pub fn selections_field(document: &Value) -> SelectionsField {
    match document.get(SELECTIONS_FIELD) {
        None => SelectionsField::Absent,
        Some(Value::Array(selections)) if selections.is_empty() => SelectionsField::Empty,
        Some(Value::Array(selections)) => SelectionsField::NonEmpty(selections.len()),
        Some(_) => SelectionsField::WrongType,
    }
}

/// Validate one response from its status code and raw body.
///
/// ```rust
/// use goose_selections::validator::{validate, Failure, Verdict};
///
/// assert_eq!(validate(200, r#"{"selections": [1]}"#), Verdict::Success);
/// assert_eq!(
///     validate(503, r#"{"selections": [1]}"#),
///     Verdict::Failure(Failure::Status(503))
/// );
/// assert!(validate(200, "<html>").is_parse_failure());
/// ```
pub fn validate(status_code: u16, body: &str) -> Verdict {
    if !(200..300).contains(&status_code) {
        return Verdict::Failure(Failure::Status(status_code));
    }

    let document: Value = match serde_json::from_str(body) {
        Ok(document) => document,
        Err(_) => {
            return Verdict::Failure(Failure::MalformedJson {
                sample: body_sample(body),
            })
        }
    };

    match selections_field(&document) {
        SelectionsField::NonEmpty(_) => Verdict::Success,
        SelectionsField::Absent | SelectionsField::WrongType | SelectionsField::Empty => {
            Verdict::Failure(Failure::NoSelections {
                sample: body_sample(body),
            })
        }
    }
}

/// The first [`BODY_SAMPLE_CHARS`] characters of a body, never splitting a character.
pub fn body_sample(body: &str) -> String {
    match body.char_indices().nth(BODY_SAMPLE_CHARS) {
        Some((end, _)) => body[..end].to_string(),
        None => body.to_string(),
    }
}
