//! CSV case tables
//!
//! Grid rows are physical lines: a blank line is an empty row, and a case
//! keeps the row index of the line its record starts on. Writing a cell
//! re-encodes only the target record and splices it back into the raw
//! bytes, so every other line (and a leading BOM) is preserved as-is.

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};

use super::replace_atomically;
use crate::common::{Error, Result};

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// One record and where its bytes sit in the file body
struct Span {
    /// 0-based physical line the record starts on
    row: usize,
    start: usize,
    end: usize,
    cells: Vec<String>,
}

/// File contents with any UTF-8 BOM split off
struct RawTable {
    bom: bool,
    body: Vec<u8>,
}

impl RawTable {
    fn open(path: &Path) -> Result<Self> {
        let mut body = fs::read(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let bom = body.starts_with(BOM);
        if bom {
            body.drain(..BOM.len());
        }
        Ok(Self { bom, body })
    }

    fn spans(&self) -> Result<Vec<Span>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(self.body.as_slice());

        let mut spans = Vec::new();
        let mut record = StringRecord::new();
        loop {
            let mut start = reader.position().byte() as usize;
            if !reader.read_record(&mut record)? {
                break;
            }
            // blank lines before the record are skipped by the reader
            while matches!(self.body.get(start), Some(b'\n' | b'\r')) {
                start += 1;
            }
            let end = (reader.position().byte() as usize).min(self.body.len());
            let row = self.body[..start].iter().filter(|b| **b == b'\n').count();

            spans.push(Span {
                row,
                start,
                end,
                cells: record.iter().map(str::to_string).collect(),
            });
        }
        Ok(spans)
    }
}

pub(super) fn read_grid(path: &Path) -> Result<Vec<Vec<String>>> {
    let table = RawTable::open(path)?;
    let mut grid: Vec<Vec<String>> = Vec::new();
    for span in table.spans()? {
        if grid.len() < span.row {
            grid.resize(span.row, Vec::new());
        }
        grid.push(span.cells);
    }
    Ok(grid)
}

/// Encode one record without its line terminator
fn encode(cells: &[String]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(cells)?;
    let mut bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }
    Ok(bytes)
}

pub(super) fn write_cell(path: &Path, row: usize, col: usize, value: &str) -> Result<()> {
    let table = RawTable::open(path).map_err(|e| Error::write_back(path, row, e))?;
    let spans = table.spans().map_err(|e| Error::write_back(path, row, e))?;
    let span = spans
        .iter()
        .find(|s| s.row == row)
        .ok_or_else(|| Error::write_back(path, row, "no record on this row"))?;

    let mut cells = span.cells.clone();
    if cells.len() <= col {
        cells.resize(col + 1, String::new());
    }
    cells[col] = value.to_string();
    let record = encode(&cells).map_err(|e| Error::write_back(path, row, e))?;

    // keep whatever terminator the original record had
    let raw = &table.body[span.start..span.end];
    let terminator = raw
        .iter()
        .rev()
        .take_while(|b| matches!(b, b'\n' | b'\r'))
        .count();

    let mut out = Vec::with_capacity(table.body.len() + record.len() + BOM.len());
    if table.bom {
        out.extend_from_slice(BOM);
    }
    out.extend_from_slice(&table.body[..span.start]);
    out.extend_from_slice(&record);
    out.extend_from_slice(&raw[raw.len() - terminator..]);
    out.extend_from_slice(&table.body[span.end..]);

    replace_atomically(path, row, |tmp| {
        fs::write(tmp, &out).map_err(|e| Error::write_back(path, row, e))
    })
}
