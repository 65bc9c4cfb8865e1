//! reqwest-backed request dispatcher

use async_trait::async_trait;
use reqwest::{Client, Method};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::body;
use super::{DispatchFailure, ResponseSummary, Transport};
use crate::cases::{join_host, CaseRequest, PayloadMode};
use crate::common::config::Config;
use crate::common::{Error, Result};

const CONTENT_TYPE: &str = "content-type";

/// Sends case requests over one shared connection pool
#[derive(Debug, Clone)]
pub struct RequestDispatcher {
    client: Client,
    host: String,
    timeout: Duration,
    default_headers: BTreeMap<String, String>,
    base_dir: Option<PathBuf>,
}

impl RequestDispatcher {
    /// Create a dispatcher from the request and environment settings
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.request.user_agent)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            host: config.environment.host.clone(),
            timeout: config.request.timeout(),
            default_headers: config.request.default_headers.clone(),
            base_dir: None,
        })
    }

    /// Directory that relative upload paths are resolved against
    pub fn with_base_dir(mut self, base_dir: Option<PathBuf>) -> Self {
        self.base_dir = base_dir;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    /// Headers actually sent: the case's own plus any missing defaults
    fn merged_headers(&self, request: &CaseRequest) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = request
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (name, value) in &self.default_headers {
            if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name)) {
                headers.push((name.clone(), value.clone()));
            }
        }
        if request.payload_mode == PayloadMode::File {
            // multipart sets its own content type with the boundary
            headers.retain(|(k, _)| !k.eq_ignore_ascii_case(CONTENT_TYPE));
        }
        headers
    }

    async fn execute(
        &self,
        request: &CaseRequest,
        start: Instant,
    ) -> std::result::Result<ResponseSummary, DispatchFailure> {
        if let PayloadMode::Unsupported(mode) = &request.payload_mode {
            tracing::error!(url = %request.url, mode = %mode, "Unsupported payload mode, request not sent");
            return Err(DispatchFailure::UnsupportedMode { mode: mode.clone() });
        }

        let method = Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            DispatchFailure::InvalidRequest {
                message: format!("{}: {}", request.method, e),
            }
        })?;
        let url = join_host(&self.host, &request.url);

        let mut builder = self.client.request(method, &url).timeout(self.timeout);
        for (name, value) in self.merged_headers(request) {
            builder = builder.header(name, value);
        }

        if let Some(payload) = &request.payload {
            builder = match &request.payload_mode {
                PayloadMode::Query => builder.query(&body::pairs(payload)),
                PayloadMode::Form => builder.form(&body::pairs(payload)),
                PayloadMode::Json => builder.json(payload),
                PayloadMode::File => {
                    builder.multipart(body::multipart(payload, self.base_dir.as_deref()).await?)
                }
                PayloadMode::Unsupported(_) => builder,
            };
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_error(e, self.timeout_ms()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| map_error(e, self.timeout_ms()))?;

        Ok(ResponseSummary::new(status, text, start.elapsed()))
    }
}

#[async_trait]
impl Transport for RequestDispatcher {
    async fn send(&self, request: &CaseRequest) -> ResponseSummary {
        tracing::info!(
            url = %request.url,
            method = %request.method,
            headers = ?request.headers,
            payload = ?request.payload,
            mode = %request.payload_mode,
            "Dispatching request"
        );

        let start = Instant::now();
        match self.execute(request, start).await {
            Ok(summary) => {
                tracing::info!(
                    status = summary.status_code,
                    elapsed = summary.elapsed_seconds,
                    "Response received"
                );
                summary
            }
            Err(failure) => {
                tracing::warn!(url = %request.url, error = %failure, "Request failed");
                ResponseSummary::transport_failure(failure, start.elapsed())
            }
        }
    }
}

/// Full error text including every source in the chain
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn url_host(error: &reqwest::Error) -> String {
    error
        .url()
        .and_then(|u| u.host_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Classify a reqwest error
fn map_error(error: reqwest::Error, timeout_ms: u64) -> DispatchFailure {
    if error.is_timeout() {
        return DispatchFailure::Timeout { timeout_ms };
    }

    let message = error_chain(&error);
    if error.is_builder() {
        return DispatchFailure::InvalidRequest { message };
    }

    if error.is_connect() {
        let lower = message.to_lowercase();
        if lower.contains("dns") || lower.contains("resolve") || lower.contains("lookup") {
            return DispatchFailure::Dns {
                host: url_host(&error),
                message,
            };
        }
        if lower.contains("refused") {
            return DispatchFailure::ConnectionRefused {
                host: url_host(&error),
                port: error
                    .url()
                    .and_then(|u| u.port_or_known_default())
                    .unwrap_or(80),
            };
        }
        return DispatchFailure::Connect { message };
    }

    DispatchFailure::Other { message }
}
