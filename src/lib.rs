//! apicase - data-driven API test runner
//!
//! Test cases live in a spreadsheet, CSV table or YAML document. Each case is
//! sent to the system under test, its response is checked against the
//! expected status, message and data fragment, and the verdict is written
//! back into the row the case came from.

pub mod cases;
pub mod cli;
pub mod commands;
pub mod common;
pub mod http;
pub mod runner;
pub mod store;
pub mod validate;
pub mod verdict;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use runner::{run_file, CaseOutcome, CaseRunner, RunReport, RunSummary};
pub use verdict::{Verdict, VerdictRecord};
