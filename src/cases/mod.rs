//! Case loading
//!
//! Reads authored test cases from a spreadsheet, a CSV table or a YAML
//! document and normalizes them into [`CaseRecord`] values. Loading is
//! all-or-nothing: one malformed row fails the whole load.

mod document;
mod substitute;
mod table;

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::common::config::Config;
use crate::common::{is_yes, Error, Result};
use crate::store::TableFormat;

pub use document::load_document;
pub use substitute::{substitute, Variables};
pub use table::{load_table, COLUMN_NAMES, INPUT_COLUMNS};

/// Header name used for the shared token
pub const AUTHORIZATION: &str = "Authorization";

/// One authored test case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseRecord {
    /// Display name, not required to be unique
    pub name: String,
    /// "yes" enables execution
    pub run_flag: String,
    /// "yes" injects the shared token
    pub requires_auth: String,
    pub request: CaseRequest,
    pub expected: Expected,
    /// 0-based row in the source grid (header rows included)
    pub row_index: usize,
}

impl CaseRecord {
    /// Whether the case is marked for execution
    pub fn should_run(&self) -> bool {
        is_yes(&self.run_flag)
    }

    /// Whether the case carries the shared token
    pub fn needs_auth(&self) -> bool {
        is_yes(&self.requires_auth)
    }
}

/// Request half of a case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseRequest {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub payload_mode: PayloadMode,
    pub payload: Option<serde_json::Map<String, serde_json::Value>>,
}

impl CaseRequest {
    /// Set a header, replacing any existing one with the same name in any case
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.into());
    }
}

/// Expected half of a case
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Expected {
    pub status_code: String,
    pub message: String,
    pub data_fragment: String,
}

/// How the payload is attached to the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadMode {
    /// `params`: query string
    Query,
    /// `data`: form-encoded body
    Form,
    /// `json`: JSON body
    Json,
    /// `file`: multipart upload
    File,
    /// Anything else; dispatching it is a configuration error
    Unsupported(String),
}

impl PayloadMode {
    /// Parse a payload-mode cell, case-insensitively. Only the four mode
    /// names are accepted; an empty cell is unsupported like any other text.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "params" => PayloadMode::Query,
            "data" => PayloadMode::Form,
            "json" => PayloadMode::Json,
            "file" => PayloadMode::File,
            _ => PayloadMode::Unsupported(raw.trim().to_string()),
        }
    }
}

impl fmt::Display for PayloadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadMode::Query => write!(f, "params"),
            PayloadMode::Form => write!(f, "data"),
            PayloadMode::Json => write!(f, "json"),
            PayloadMode::File => write!(f, "file"),
            PayloadMode::Unsupported(raw) => write!(f, "{}", raw),
        }
    }
}

impl Serialize for PayloadMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Kind of backing store a case file is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Table(TableFormat),
    Document,
}

impl SourceKind {
    /// Detect the source kind from the file extension
    pub fn detect(path: &Path) -> Result<Self> {
        if let Some(format) = TableFormat::from_path(path) {
            return Ok(SourceKind::Table(format));
        }
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => Ok(SourceKind::Document),
            _ => Err(Error::UnsupportedSource {
                path: path.display().to_string(),
            }),
        }
    }
}

/// Load every case from a backing store, choosing the loader by extension
pub fn load_cases(path: &Path, config: &Config) -> Result<Vec<CaseRecord>> {
    let cases = match SourceKind::detect(path)? {
        SourceKind::Table(format) => load_table(path, format, config)?,
        SourceKind::Document => load_document(path, config)?,
    };
    tracing::info!(
        path = %path.display(),
        count = cases.len(),
        "Loaded test cases"
    );
    Ok(cases)
}

/// Build the request URL from the configured host and a cell value
pub(crate) fn join_host(host: &str, url: &str) -> String {
    if is_absolute_url(url) || host.is_empty() {
        url.to_string()
    } else {
        format!("{}{}", host, url)
    }
}

pub(crate) fn is_absolute_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Inject the shared token when the case asks for it
pub(crate) fn apply_auth(record: &mut CaseRecord, token: &str) {
    if record.needs_auth() {
        record.request.set_header(AUTHORIZATION, token);
    }
}

/// Check that a method cell names a valid HTTP verb and uppercase it
pub(crate) fn normalize_method(row: usize, raw: &str) -> Result<String> {
    let method = raw.trim().to_ascii_uppercase();
    if method.is_empty() {
        return Err(Error::invalid_case(row, "missing request method"));
    }
    reqwest::Method::from_bytes(method.as_bytes())
        .map_err(|_| Error::invalid_case(row, format!("invalid request method '{}'", raw.trim())))?;
    Ok(method)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_mode_parse() {
        assert_eq!(PayloadMode::parse("params"), PayloadMode::Query);
        assert_eq!(PayloadMode::parse(""), PayloadMode::Unsupported(String::new()));
        for alias in ["query", "form", "files"] {
            assert_eq!(PayloadMode::parse(alias), PayloadMode::Unsupported(alias.to_string()));
        }
        assert_eq!(PayloadMode::parse(" DATA "), PayloadMode::Form);
        assert_eq!(PayloadMode::parse("json"), PayloadMode::Json);
        assert_eq!(PayloadMode::parse("file"), PayloadMode::File);
        assert_eq!(
            PayloadMode::parse("xml"),
            PayloadMode::Unsupported("xml".to_string())
        );
    }

    #[test]
    fn test_join_host() {
        assert_eq!(
            join_host("http://api.local", "/api/user/1"),
            "http://api.local/api/user/1"
        );
        assert_eq!(
            join_host("http://api.local", "https://other.local/x"),
            "https://other.local/x"
        );
        assert_eq!(join_host("", "/api"), "/api");
    }

    #[test]
    fn test_set_header_replaces_any_case() {
        let mut request = CaseRequest {
            url: String::new(),
            method: "GET".into(),
            headers: BTreeMap::from([("authorization".to_string(), "old".to_string())]),
            payload_mode: PayloadMode::Query,
            payload: None,
        };
        request.set_header(AUTHORIZATION, "Bearer new");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.headers.get("Authorization").map(String::as_str), Some("Bearer new"));
    }

    #[test]
    fn test_normalize_method() {
        assert_eq!(normalize_method(1, " get ").unwrap(), "GET");
        assert!(matches!(
            normalize_method(4, ""),
            Err(Error::InvalidCase { row: 4, .. })
        ));
        assert!(normalize_method(4, "GE T").is_err());
    }

    #[test]
    fn test_detect_source_kind() {
        assert_eq!(
            SourceKind::detect(Path::new("case.yaml")).unwrap(),
            SourceKind::Document
        );
        assert_eq!(
            SourceKind::detect(Path::new("case.XLSX")).unwrap(),
            SourceKind::Table(TableFormat::Xlsx)
        );
        assert!(matches!(
            SourceKind::detect(Path::new("case.ini")),
            Err(Error::UnsupportedSource { .. })
        ));
    }
}
