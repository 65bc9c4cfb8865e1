//! Verdicts and the records persisted for each case

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tri-state outcome of running a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    Skip,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
            Verdict::Skip => "skip",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What gets written back to the case's row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictRecord {
    pub case_name: String,
    pub verdict: Verdict,
    /// Response body on pass/fail, error description on transport failure,
    /// empty for skipped cases
    pub response_text: String,
}

impl VerdictRecord {
    pub fn skipped(case_name: &str) -> Self {
        Self {
            case_name: case_name.to_string(),
            verdict: Verdict::Skip,
            response_text: String::new(),
        }
    }

    pub fn is_pass(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}
