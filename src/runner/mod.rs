//! Case execution
//!
//! Cases run one at a time in source order. Each case either skips (no
//! request) or goes through dispatch, validation and write-back. Nothing a
//! single case does can stop the run; only loading errors escape.

mod report;

pub use report::{CaseOutcome, RunReport, RunSummary};

use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::time::Instant;

use crate::cases::{load_cases, CaseRecord, SourceKind};
use crate::common::config::Config;
use crate::common::paths::case_dir;
use crate::common::Result;
use crate::http::{RequestDispatcher, Transport};
use crate::store::{Discard, ResultSink, ResultWriter};
use crate::validate::validate;
use crate::verdict::{Verdict, VerdictRecord};

/// Drives cases through a transport
pub struct CaseRunner<T> {
    transport: T,
}

impl<T: Transport> CaseRunner<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one case and record its verdict
    pub async fn run_case(&self, case: &CaseRecord, sink: &dyn ResultSink) -> CaseOutcome {
        let mut outcome = CaseOutcome {
            record: VerdictRecord::skipped(&case.name),
            row_index: case.row_index,
            request: case.request.clone(),
            expected: case.expected.clone(),
            response: None,
            mismatches: Vec::new(),
            fault: None,
            write_error: None,
        };

        if !case.should_run() {
            tracing::info!(case = %case.name, row = case.row_index, "Skipping case");
        } else {
            tracing::info!(case = %case.name, row = case.row_index, "Running case");

            let attempt = AssertUnwindSafe(async {
                let response = self.transport.send(&case.request).await;
                let validation = validate(&case.expected, &response);
                (response, validation)
            })
            .catch_unwind()
            .await;

            match attempt {
                Ok((response, validation)) => {
                    outcome.record.verdict = validation.verdict;
                    outcome.record.response_text = response.body.clone();
                    outcome.mismatches = validation.mismatches;
                    outcome.response = Some(response);
                }
                Err(panic) => {
                    let fault = panic_message(panic.as_ref());
                    tracing::error!(case = %case.name, fault = %fault, "Case aborted unexpectedly");
                    outcome.record.verdict = Verdict::Fail;
                    outcome.record.response_text = fault.clone();
                    outcome.fault = Some(fault);
                }
            }

            for mismatch in &outcome.mismatches {
                tracing::debug!(case = %case.name, mismatch = %mismatch, "Check failed");
            }
        }

        tracing::info!(case = %case.name, verdict = %outcome.verdict(), "Case finished");

        if let Err(e) = sink.record(case.row_index, &outcome.record).await {
            outcome.write_error = Some(e.to_string());
        }
        outcome
    }

    /// Run every case in order
    pub async fn run(&self, cases: &[CaseRecord], sink: &dyn ResultSink) -> Vec<CaseOutcome> {
        self.run_with_progress(cases, sink, |_| {}).await
    }

    /// Run every case in order, reporting each outcome as it completes
    pub async fn run_with_progress<F>(
        &self,
        cases: &[CaseRecord],
        sink: &dyn ResultSink,
        mut progress: F,
    ) -> Vec<CaseOutcome>
    where
        F: FnMut(&CaseOutcome),
    {
        let mut outcomes = Vec::with_capacity(cases.len());
        for case in cases {
            let outcome = self.run_case(case, sink).await;
            progress(&outcome);
            outcomes.push(outcome);
        }
        outcomes
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Load a case file and run it against the configured environment.
///
/// Tables get their verdicts written back; documents do not.
pub async fn run_file<F>(path: &Path, config: &Config, progress: F) -> Result<RunReport>
where
    F: FnMut(&CaseOutcome),
{
    let kind = SourceKind::detect(path)?;
    let cases = load_cases(path, config)?;

    let dispatcher = RequestDispatcher::new(config)?.with_base_dir(case_dir(path));
    let runner = CaseRunner::new(dispatcher);

    let sink: Box<dyn ResultSink> = match kind {
        SourceKind::Table(format) => Box::new(ResultWriter::new(path, format)),
        SourceKind::Document => Box::new(Discard),
    };

    tracing::info!(
        source = %path.display(),
        environment = %config.environment.name,
        cases = cases.len(),
        "Starting run"
    );

    let started = Instant::now();
    let outcomes = runner
        .run_with_progress(&cases, sink.as_ref(), progress)
        .await;
    let summary = RunSummary::from_outcomes(&outcomes, started.elapsed());

    tracing::info!(
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        skipped = summary.skipped,
        "Run finished"
    );

    Ok(RunReport {
        environment: config.environment.name.clone(),
        source: path.display().to_string(),
        outcomes,
        summary,
    })
}
