//! Outbound HTTP dispatch
//!
//! Every dispatched case yields a [`ResponseSummary`]. Transport problems
//! never surface as errors: they become a summary with status 0 whose body
//! describes what went wrong.

mod body;
mod dispatcher;

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::cases::CaseRequest;

pub use dispatcher::RequestDispatcher;

/// Status code used for responses that never arrived
pub const TRANSPORT_FAILURE_STATUS: u16 = 0;

/// Outcome of one dispatched request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSummary {
    /// HTTP status, or 0 when the request failed below HTTP
    pub status_code: u16,
    /// Raw response text, or the failure description
    pub body: String,
    pub elapsed_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<DispatchFailure>,
}

impl ResponseSummary {
    pub fn new(status_code: u16, body: String, elapsed: Duration) -> Self {
        Self {
            status_code,
            body,
            elapsed_seconds: elapsed.as_secs_f64(),
            failure: None,
        }
    }

    /// Synthetic summary for a request that produced no HTTP response
    pub fn transport_failure(failure: DispatchFailure, elapsed: Duration) -> Self {
        Self {
            status_code: TRANSPORT_FAILURE_STATUS,
            body: failure.to_string(),
            elapsed_seconds: elapsed.as_secs_f64(),
            failure: Some(failure),
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// Why a request produced no HTTP response
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchFailure {
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Connection refused: {host}:{port}")]
    ConnectionRefused { host: String, port: u16 },

    #[error("DNS lookup failed for {host}: {message}")]
    Dns { host: String, message: String },

    #[error("Connection failed: {message}")]
    Connect { message: String },

    #[error("Unsupported payload mode '{mode}'")]
    UnsupportedMode { mode: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Failed to build request payload: {message}")]
    PayloadBuild { message: String },

    #[error("Request failed: {message}")]
    Other { message: String },
}

/// Something that can carry a case request to the system under test
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request; always produces a summary
    async fn send(&self, request: &CaseRequest) -> ResponseSummary;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_failure_summary() {
        let summary = ResponseSummary::transport_failure(
            DispatchFailure::Timeout { timeout_ms: 250 },
            Duration::from_millis(251),
        );
        assert_eq!(summary.status_code, 0);
        assert_eq!(summary.body, "Request timed out after 250ms");
        assert!(summary.is_transport_failure());
        assert!(summary.elapsed_seconds > 0.25);
    }

    #[test]
    fn test_failure_serializes_with_kind_tag() {
        let value = serde_json::to_value(DispatchFailure::UnsupportedMode {
            mode: "xml".to_string(),
        })
        .unwrap();
        assert_eq!(value["kind"], "unsupported_mode");
        assert_eq!(value["mode"], "xml");
    }
}
