//! YAML case documents
//!
//! ```yaml
//! Case:
//!   - Test:
//!       name: get_user
//!       run: yes
//!       token: yes
//!       type: params
//!       request: { url: "${host}/api/user/1", method: GET, headers: {}, data: {} }
//!       expected: { status_code: 200, msg: ok, data: "\"id\": 1" }
//! ```
//!
//! Placeholders are substituted over the raw text before parsing.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Value};

use super::substitute::{substitute, Variables};
use super::{apply_auth, join_host, normalize_method, CaseRecord, CaseRequest, Expected, PayloadMode};
use crate::common::config::Config;
use crate::common::{Error, Result};

/// Load every `Test` leaf of a YAML case document
pub fn load_document(path: &Path, config: &Config) -> Result<Vec<CaseRecord>> {
    let raw = fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    let text = substitute(&raw, &Variables::from_config(config))?;
    parse_document(&text, config)
}

fn parse_document(text: &str, config: &Config) -> Result<Vec<CaseRecord>> {
    let root: Value = serde_yaml::from_str(text).map_err(|e| Error::Document(e.to_string()))?;

    let entries = root
        .get("Case")
        .ok_or_else(|| Error::Document("missing top-level 'Case' list".to_string()))?
        .as_sequence()
        .ok_or_else(|| Error::Document("'Case' must be a list".to_string()))?;

    let mut cases = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let entry = entry
            .as_mapping()
            .ok_or_else(|| Error::invalid_case(index, "'Case' entries must be mappings"))?;
        let Some(test) = entry.get("Test") else {
            continue;
        };
        let test = test
            .as_mapping()
            .ok_or_else(|| Error::invalid_case(index, "'Test' must be a mapping"))?;
        let mut record = parse_test(index, test, config)?;
        apply_auth(&mut record, &config.environment.token);
        cases.push(record);
    }
    Ok(cases)
}

fn parse_test(index: usize, test: &Mapping, config: &Config) -> Result<CaseRecord> {
    let field = |map: &Mapping, key: &str| map.get(key).map(scalar).unwrap_or_default();
    let section = |key: &str| -> Result<Mapping> {
        match test.get(key) {
            None | Some(Value::Null) => Ok(Mapping::new()),
            Some(Value::Mapping(map)) => Ok(map.clone()),
            Some(_) => Err(Error::invalid_case(index, format!("'{}' must be a mapping", key))),
        }
    };

    let name = field(test, "name");
    if name.is_empty() {
        return Err(Error::invalid_case(index, "missing case name"));
    }

    let request = section("request")?;
    let expected = section("expected")?;

    let url = field(&request, "url");
    if url.is_empty() {
        return Err(Error::invalid_case(index, "missing request url"));
    }

    Ok(CaseRecord {
        name,
        run_flag: field(test, "run"),
        requires_auth: field(test, "token"),
        request: CaseRequest {
            url: join_host(&config.environment.host, &url),
            method: normalize_method(index, &field(&request, "method"))?,
            headers: headers(index, request.get("headers"))?,
            payload_mode: PayloadMode::parse(&field(test, "type")),
            payload: payload(index, request.get("data"))?,
        },
        expected: Expected {
            status_code: field(&expected, "status_code"),
            message: field(&expected, "msg"),
            data_fragment: field(&expected, "data"),
        },
        row_index: index,
    })
}

/// Render a scalar as cell text; booleans become "yes"/"no"
fn scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn headers(index: usize, value: Option<&Value>) -> Result<BTreeMap<String, String>> {
    match value {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::Mapping(map)) => map
            .iter()
            .map(|(k, v)| {
                let name = k
                    .as_str()
                    .ok_or_else(|| Error::invalid_case(index, "header names must be strings"))?;
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => scalar(other),
                };
                Ok((name.to_string(), value))
            })
            .collect(),
        Some(_) => Err(Error::invalid_case(index, "'headers' must be a mapping")),
    }
}

fn payload(
    index: usize,
    value: Option<&Value>,
) -> Result<Option<serde_json::Map<String, serde_json::Value>>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) if value.is_mapping() => match serde_json::to_value(value) {
            Ok(serde_json::Value::Object(map)) => Ok(Some(map)),
            Ok(_) => Err(Error::invalid_case(index, "'data' must be a mapping")),
            Err(e) => Err(Error::invalid_case(index, format!("invalid 'data': {}", e))),
        },
        Some(_) => Err(Error::invalid_case(index, "'data' must be a mapping")),
    }
}
