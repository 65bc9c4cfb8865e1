//! Configuration file handling
//!
//! The configuration is read once at process start and passed by reference
//! into the case loaders and the request dispatcher.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};

/// Environment variable overriding `environment.host`
pub const HOST_ENV: &str = "APICASE_HOST";
/// Environment variable overriding `environment.token`
pub const TOKEN_ENV: &str = "APICASE_TOKEN";

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Target environment (host, shared token, labels)
    #[serde(default)]
    pub environment: Environment,

    /// Outbound request settings
    #[serde(default)]
    pub request: RequestConfig,

    /// Default case sources
    #[serde(default)]
    pub cases: CasesConfig,

    /// Log file settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Target environment settings
#[derive(Debug, Deserialize, Clone)]
pub struct Environment {
    /// Label shown in logs and the run summary
    #[serde(default = "default_environment_name")]
    pub name: String,

    /// API host base URL, prefixed to tabular URL cells
    #[serde(default)]
    pub host: String,

    /// Shared `Authorization` value injected into cases that require auth
    #[serde(default)]
    pub token: String,

    /// Person running the suite
    #[serde(default)]
    pub tester: Option<String>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            name: default_environment_name(),
            host: String::new(),
            token: String::new(),
            tester: None,
        }
    }
}

fn default_environment_name() -> String {
    "default".to_string()
}

/// Outbound request settings
#[derive(Debug, Deserialize, Clone)]
pub struct RequestConfig {
    /// Upper bound for every request
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Headers added when a case does not set them itself
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            default_headers: BTreeMap::new(),
        }
    }
}

impl RequestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("apicase/{}", env!("CARGO_PKG_VERSION"))
}

/// Default case sources used when `run` gets no explicit path
#[derive(Debug, Deserialize, Clone)]
pub struct CasesConfig {
    /// Spreadsheet or CSV case table
    #[serde(default)]
    pub table: Option<PathBuf>,

    /// YAML case document
    #[serde(default)]
    pub document: Option<PathBuf>,

    /// Number of header rows before the first case row
    #[serde(default = "default_header_rows")]
    pub header_rows: usize,
}

impl Default for CasesConfig {
    fn default() -> Self {
        Self {
            table: None,
            document: None,
            header_rows: default_header_rows(),
        }
    }
}

fn default_header_rows() -> usize {
    1
}

/// Log file settings
#[derive(Debug, Deserialize, Default, Clone)]
pub struct LoggingConfig {
    /// Directory for the daily rolling log file; stdout only when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        let config = match config_path() {
            Some(path) if path.exists() => Self::read(&path)?,
            _ => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Load configuration from an explicit path, or the default location
    ///
    /// Unlike [`Config::load`], a missing explicit file is an error.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Ok(Self::read(path)?.with_env_overrides()),
            None => Self::load(),
        }
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Apply `APICASE_HOST` / `APICASE_TOKEN` overrides, as CI jobs inject them
    fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var(HOST_ENV) {
            if !host.trim().is_empty() {
                self.environment.host = host.trim().to_string();
            }
        }
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.environment.token = token.trim().to_string();
            }
        }
        self
    }
}
