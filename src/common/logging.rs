//! Logging and tracing configuration
//!
//! Console logging for every run, plus an optional daily rolling log file
//! so failed runs can be inspected after the fact.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name prefix for the rolling log file
pub const LOG_FILE_NAME: &str = "apicase.log";

/// Initialize tracing for the CLI
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate (DEBUG when `verbose`), WARN for
/// dependencies. Console output goes to stderr so stdout stays clean for
/// reports.
///
/// When `log_dir` is set, a second layer writes full details to
/// `<log_dir>/apicase.log.<date>`. The returned guard must be held until
/// the process exits so buffered lines are flushed.
pub fn init_cli(log_dir: Option<&Path>, verbose: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let (file_layer, guard) = match log_dir.map(open_log_dir) {
        Some(Ok(dir)) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            eprintln!("Warning: Could not open log directory: {}", e);
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "apicase=debug,warn"
    } else {
        "apicase=info,warn"
    }
}

fn open_log_dir(dir: &Path) -> std::io::Result<&Path> {
    std::fs::create_dir_all(dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives(false), "apicase=info,warn");
        assert_eq!(default_directives(true), "apicase=debug,warn");
    }

    #[test]
    fn test_open_log_dir_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs").join("api");
        assert!(open_log_dir(&nested).is_ok());
        assert!(nested.is_dir());
    }
}
