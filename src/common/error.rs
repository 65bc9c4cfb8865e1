//! Error types for apicase
//!
//! Only load-time and configuration failures travel through this type to
//! the caller. Per-case problems (transport failures, validation
//! mismatches, write-back failures) are carried as data on the case
//! outcome instead.

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for apicase
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === Case Loading Errors ===
    #[error("Unsupported case source '{path}'. Expected .xlsx, .csv, .yaml or .yml")]
    UnsupportedSource { path: String },

    #[error("Case table '{path}' is missing column '{column}' (found {found} columns)")]
    MissingColumn {
        path: String,
        column: &'static str,
        found: usize,
    },

    #[error("Invalid case at row {row}: {reason}")]
    InvalidCase { row: usize, reason: String },

    #[error("Unresolved placeholder '${{{name}}}' on line {line}")]
    UnresolvedPlaceholder { name: String, line: usize },

    #[error("Invalid placeholder on line {line}, column {column}")]
    InvalidPlaceholder { line: usize, column: usize },

    #[error("Failed to parse case document: {0}")]
    Document(String),

    // === Backing Store Errors ===
    #[error("Failed to open workbook '{path}': {reason}")]
    Workbook { path: String, reason: String },

    #[error("Failed to write result to '{path}' (row {row}): {reason}")]
    WriteBack {
        path: String,
        row: usize,
        reason: String,
    },

    // === IO Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // === Test Errors ===
    #[error("Test assertion failed: {0}")]
    TestAssertion(String),
}

impl Error {
    /// Create an invalid case error for a source row
    pub fn invalid_case(row: usize, reason: impl Into<String>) -> Self {
        Self::InvalidCase {
            row,
            reason: reason.into(),
        }
    }

    /// Create a write-back error for a backing store cell
    pub fn write_back(path: &std::path::Path, row: usize, reason: impl ToString) -> Self {
        Self::WriteBack {
            path: path.display().to_string(),
            row,
            reason: reason.to_string(),
        }
    }

    /// Whether the error happened while loading cases (fatal to a run)
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedSource { .. }
                | Error::MissingColumn { .. }
                | Error::InvalidCase { .. }
                | Error::UnresolvedPlaceholder { .. }
                | Error::InvalidPlaceholder { .. }
                | Error::Document(_)
                | Error::Workbook { .. }
                | Error::FileRead { .. }
                | Error::Csv(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_message_shows_braces() {
        let err = Error::UnresolvedPlaceholder {
            name: "host".to_string(),
            line: 3,
        };
        assert_eq!(err.to_string(), "Unresolved placeholder '${host}' on line 3");
    }

    #[test]
    fn test_load_error_classification() {
        assert!(Error::invalid_case(2, "bad headers").is_load_error());
        assert!(!Error::TestAssertion("x".into()).is_load_error());
        assert!(!Error::write_back(std::path::Path::new("a.xlsx"), 1, "locked").is_load_error());
    }
}
