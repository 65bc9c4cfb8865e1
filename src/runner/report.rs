//! Per-case outcomes and run totals

use serde::Serialize;
use std::fmt::Write as _;
use std::time::Duration;

use crate::cases::{CaseRequest, Expected};
use crate::common::{Error, Result};
use crate::http::ResponseSummary;
use crate::validate::Mismatch;
use crate::verdict::{Verdict, VerdictRecord};

/// Everything known about one executed (or skipped) case
#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    #[serde(flatten)]
    pub record: VerdictRecord,
    pub row_index: usize,
    pub request: CaseRequest,
    pub expected: Expected,
    /// Absent for skipped cases and runner faults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mismatches: Vec<Mismatch>,
    /// Panic text caught while dispatching or validating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
    /// Write-back failure; the verdict itself still stands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_error: Option<String>,
}

impl CaseOutcome {
    pub fn name(&self) -> &str {
        &self.record.case_name
    }

    pub fn verdict(&self) -> Verdict {
        self.record.verdict
    }

    pub fn passed(&self) -> bool {
        self.record.is_pass()
    }

    /// Harness assertion: skipped and passing cases are fine, anything else
    /// is an error describing what was sent, expected and received
    pub fn assert_passed(&self) -> Result<()> {
        if self.verdict() != Verdict::Fail {
            return Ok(());
        }

        let mut message = format!("case '{}' failed\n", self.name());
        let _ = writeln!(
            message,
            "  request:  {} {}",
            self.request.method, self.request.url
        );
        let _ = writeln!(
            message,
            "  expected: status={} msg='{}' data='{}'",
            self.expected.status_code, self.expected.message, self.expected.data_fragment
        );
        match &self.response {
            Some(response) => {
                let _ = writeln!(message, "  actual:   status={}", response.status_code);
            }
            None => {
                let _ = writeln!(message, "  actual:   no response");
            }
        }
        for mismatch in &self.mismatches {
            let _ = writeln!(message, "  - {}", mismatch);
        }
        if let Some(fault) = &self.fault {
            let _ = writeln!(message, "  fault: {}", fault);
        }
        let _ = write!(message, "  response: {}", self.record.response_text);

        Err(Error::TestAssertion(message))
    }
}

/// Totals for a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Percentage of passed cases over all cases, two decimals
    pub success_rate: f64,
    pub duration_secs: f64,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[CaseOutcome], duration: Duration) -> Self {
        let count = |verdict| outcomes.iter().filter(|o| o.verdict() == verdict).count();
        let total = outcomes.len();
        let passed = count(Verdict::Pass);

        let success_rate = if total == 0 {
            0.0
        } else {
            (passed as f64 / total as f64 * 10_000.0).round() / 100.0
        };

        Self {
            total,
            passed,
            failed: count(Verdict::Fail),
            skipped: count(Verdict::Skip),
            success_rate,
            duration_secs: duration.as_secs_f64(),
        }
    }
}

/// Outcomes of a run in source order
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub environment: String,
    pub source: String,
    pub outcomes: Vec<CaseOutcome>,
    pub summary: RunSummary,
}

impl RunReport {
    /// True when no case failed
    pub fn is_success(&self) -> bool {
        self.summary.failed == 0
    }

    /// Assert every case, collecting all failures into one error
    pub fn assert_all_passed(&self) -> Result<()> {
        let failures: Vec<String> = self
            .outcomes
            .iter()
            .filter_map(|o| o.assert_passed().err())
            .map(|e| e.to_string())
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::TestAssertion(failures.join("\n")))
        }
    }

    pub fn write_errors(&self) -> impl Iterator<Item = (&CaseOutcome, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.write_error.as_deref().map(|e| (o, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cases::PayloadMode;
    use std::collections::BTreeMap;

    fn outcome(verdict: Verdict) -> CaseOutcome {
        CaseOutcome {
            record: VerdictRecord {
                case_name: "get_user".to_string(),
                verdict,
                response_text: "{\"msg\": \"not found\"}".to_string(),
            },
            row_index: 1,
            request: CaseRequest {
                url: "http://api.local/api/user/1".to_string(),
                method: "GET".to_string(),
                headers: BTreeMap::new(),
                payload_mode: PayloadMode::Query,
                payload: None,
            },
            expected: Expected {
                status_code: "200".to_string(),
                message: "ok".to_string(),
                data_fragment: "id".to_string(),
            },
            response: None,
            mismatches: vec![Mismatch::Status {
                expected: "200".to_string(),
                actual: 404,
            }],
            fault: None,
            write_error: None,
        }
    }

    #[test]
    fn test_summary_counts_and_rate() {
        let outcomes = vec![
            outcome(Verdict::Pass),
            outcome(Verdict::Fail),
            outcome(Verdict::Skip),
        ];
        let summary = RunSummary::from_outcomes(&outcomes, Duration::from_secs(2));
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.success_rate, 33.33);
        assert_eq!(summary.duration_secs, 2.0);
    }

    #[test]
    fn test_empty_summary_rate_is_zero() {
        let summary = RunSummary::from_outcomes(&[], Duration::ZERO);
        assert_eq!(summary.success_rate, 0.0);
    }

    #[test]
    fn test_assert_passed_carries_diagnostics() {
        assert!(outcome(Verdict::Pass).assert_passed().is_ok());
        assert!(outcome(Verdict::Skip).assert_passed().is_ok());

        let err = outcome(Verdict::Fail).assert_passed().unwrap_err();
        let text = err.to_string();
        assert!(text.contains("get_user"));
        assert!(text.contains("status=200"));
        assert!(text.contains("got 404"));
        assert!(text.contains("not found"));
    }

    #[test]
    fn test_assert_all_passed_collects_failures() {
        let report = |outcomes: Vec<CaseOutcome>| RunReport {
            environment: "test".to_string(),
            source: "case.csv".to_string(),
            summary: RunSummary::from_outcomes(&outcomes, Duration::ZERO),
            outcomes,
        };

        assert!(report(vec![outcome(Verdict::Pass), outcome(Verdict::Skip)])
            .assert_all_passed()
            .is_ok());

        let err = report(vec![
            outcome(Verdict::Fail),
            outcome(Verdict::Pass),
            outcome(Verdict::Fail),
        ])
        .assert_all_passed()
        .unwrap_err();
        assert!(matches!(err, Error::TestAssertion(_)));
        assert_eq!(err.to_string().matches("get_user").count(), 2);
    }

    #[test]
    fn test_outcome_json_shape() {
        let value = serde_json::to_value(outcome(Verdict::Fail)).unwrap();
        assert_eq!(value["case_name"], "get_user");
        assert_eq!(value["verdict"], "fail");
        assert_eq!(value["request"]["payload_mode"], "params");
        assert_eq!(value["mismatches"][0]["check"], "status");
        assert!(value.get("response").is_none());
    }
}
