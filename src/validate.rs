//! Response validation
//!
//! A case passes only when the status code, the `msg` field of the JSON
//! body and the expected data fragment all match. Validation never fails
//! with an error; every problem is reported as a [`Mismatch`].

use serde::Serialize;
use serde_json::Value;

use crate::cases::Expected;
use crate::http::ResponseSummary;
use crate::verdict::Verdict;

/// JSON key holding the response message
pub const MESSAGE_KEY: &str = "msg";

/// One failed check
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Mismatch {
    /// Status code differs (or the expected value is not a status code)
    Status { expected: String, actual: u16 },
    /// Body is not JSON, so the message cannot be extracted
    UnparseableBody { error: String },
    /// Body is JSON but not an object carrying a message
    MissingMessage,
    Message { expected: String, actual: String },
    /// Expected fragment is empty; an empty fragment never matches
    EmptyFragment,
    FragmentNotFound { fragment: String },
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mismatch::Status { expected, actual } => {
                write!(f, "status: expected {}, got {}", expected, actual)
            }
            Mismatch::UnparseableBody { error } => write!(f, "body is not JSON: {}", error),
            Mismatch::MissingMessage => write!(f, "body has no '{}' field", MESSAGE_KEY),
            Mismatch::Message { expected, actual } => {
                write!(f, "msg: expected '{}', got '{}'", expected, actual)
            }
            Mismatch::EmptyFragment => write!(f, "expected data fragment is empty"),
            Mismatch::FragmentNotFound { fragment } => {
                write!(f, "data fragment '{}' not found in body", fragment)
            }
        }
    }
}

/// Result of checking one response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Validation {
    pub verdict: Verdict,
    pub mismatches: Vec<Mismatch>,
}

impl Validation {
    pub fn is_pass(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

/// Check a response against the expected values
pub fn validate(expected: &Expected, response: &ResponseSummary) -> Validation {
    let mut mismatches = Vec::new();

    if !status_matches(&expected.status_code, response.status_code) {
        mismatches.push(Mismatch::Status {
            expected: expected.status_code.trim().to_string(),
            actual: response.status_code,
        });
    }

    let parsed = serde_json::from_str::<Value>(&response.body);

    match &parsed {
        Ok(body) => match body.as_object().and_then(|o| o.get(MESSAGE_KEY)) {
            Some(msg) => {
                let actual = match msg {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                if actual != expected.message {
                    mismatches.push(Mismatch::Message {
                        expected: expected.message.clone(),
                        actual,
                    });
                }
            }
            None => mismatches.push(Mismatch::MissingMessage),
        },
        Err(e) => mismatches.push(Mismatch::UnparseableBody {
            error: e.to_string(),
        }),
    }

    let fragment = &expected.data_fragment;
    if fragment.is_empty() {
        mismatches.push(Mismatch::EmptyFragment);
    } else {
        let in_raw = response.body.contains(fragment.as_str());
        let in_compact = parsed
            .as_ref()
            .map(|body| body.to_string().contains(fragment.as_str()))
            .unwrap_or(false);
        if !in_raw && !in_compact {
            mismatches.push(Mismatch::FragmentNotFound {
                fragment: fragment.clone(),
            });
        }
    }

    let verdict = if mismatches.is_empty() {
        Verdict::Pass
    } else {
        Verdict::Fail
    };
    Validation {
        verdict,
        mismatches,
    }
}

/// Compare an expected status cell with the actual code.
/// "200", " 200 " and "200.0" all equal 200.
fn status_matches(expected: &str, actual: u16) -> bool {
    let expected = expected.trim();
    if let Ok(code) = expected.parse::<u16>() {
        return code == actual;
    }
    match expected.parse::<f64>() {
        Ok(code) => code.fract() == 0.0 && code == f64::from(actual),
        Err(_) => false,
    }
}
