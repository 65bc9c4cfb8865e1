//! Tabular case sources (`.xlsx`, `.csv`)
//!
//! The schema is positional; see [`COLUMN_NAMES`]. The result and response
//! columns may be absent until the first write-back creates them.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};

use super::{apply_auth, join_host, normalize_method, CaseRecord, CaseRequest, Expected, PayloadMode};
use crate::common::config::Config;
use crate::common::{normalize_cell, Error, Result};
use crate::store::{self, TableFormat};

/// Logical column order of a case table
pub const COLUMN_NAMES: [&str; 13] = [
    "name",
    "run",
    "auth",
    "url",
    "payload",
    "method",
    "mode",
    "headers",
    "expected_status",
    "expected_msg",
    "expected_data",
    "result",
    "response",
];

/// Columns a case row must provide; the rest are written by the runner
pub const INPUT_COLUMNS: usize = 11;

const NAME: usize = 0;
const RUN: usize = 1;
const AUTH: usize = 2;
const URL: usize = 3;
const PAYLOAD: usize = 4;
const METHOD: usize = 5;
const MODE: usize = 6;
const HEADERS: usize = 7;
const STATUS: usize = 8;
const MESSAGE: usize = 9;
const DATA: usize = 10;

/// Load every case row of a spreadsheet or CSV table
pub fn load_table(path: &Path, format: TableFormat, config: &Config) -> Result<Vec<CaseRecord>> {
    let grid = store::read_grid(path, format)?;
    let header_rows = config.cases.header_rows;

    if header_rows > 0 {
        // workbook rows come back padded to the widest row; count named cells
        let found = grid
            .first()
            .and_then(|header| header.iter().rposition(|c| !c.trim().is_empty()))
            .map_or(0, |last| last + 1);
        if found < INPUT_COLUMNS {
            return Err(Error::MissingColumn {
                path: path.display().to_string(),
                column: COLUMN_NAMES[found],
                found,
            });
        }
    }

    let mut cases = Vec::new();
    for (row_index, cells) in grid.iter().enumerate().skip(header_rows) {
        let cell = |i: usize| cells.get(i).map(|c| normalize_cell(c)).unwrap_or_default();
        if (0..INPUT_COLUMNS).all(|i| cell(i).is_empty()) {
            continue;
        }

        let name = cell(NAME);
        if name.is_empty() {
            return Err(Error::invalid_case(row_index, "missing case name"));
        }
        let suffix = cell(URL);
        if suffix.is_empty() {
            return Err(Error::invalid_case(row_index, "missing request url"));
        }

        let mut record = CaseRecord {
            name,
            run_flag: cell(RUN),
            requires_auth: cell(AUTH),
            request: CaseRequest {
                url: join_host(&config.environment.host, &suffix),
                method: normalize_method(row_index, &cell(METHOD))?,
                headers: parse_headers(row_index, &cell(HEADERS))?,
                payload_mode: PayloadMode::parse(&cell(MODE)),
                payload: parse_payload(row_index, &cell(PAYLOAD))?,
            },
            expected: Expected {
                status_code: cell(STATUS),
                message: cell(MESSAGE),
                data_fragment: cell(DATA),
            },
            row_index,
        };
        apply_auth(&mut record, &config.environment.token);

        tracing::debug!(row = row_index, case = %record.name, "Parsed case row");
        cases.push(record);
    }

    Ok(cases)
}

fn parse_object(row: usize, column: &str, raw: &str) -> Result<Option<Map<String, Value>>> {
    if raw.is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(Value::Null) => Ok(None),
        Ok(other) => Err(Error::invalid_case(
            row,
            format!("{} must be a JSON object, got {}", column, other),
        )),
        Err(e) => Err(Error::invalid_case(row, format!("invalid {} JSON: {}", column, e))),
    }
}

fn parse_headers(row: usize, raw: &str) -> Result<BTreeMap<String, String>> {
    let map = parse_object(row, "headers", raw)?.unwrap_or_default();
    Ok(map
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (name, value)
        })
        .collect())
}

fn parse_payload(row: usize, raw: &str) -> Result<Option<Map<String, Value>>> {
    parse_object(row, "payload", raw)
}
