//! Result write-back
//!
//! Persists verdicts into the row a case was loaded from. Every write
//! reopens the file, changes one cell and atomically replaces the file, so
//! an interrupted run can lose at most the cell being written.

mod csv_table;
mod xlsx;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::common::{Error, Result};
use crate::verdict::{Verdict, VerdictRecord};

/// Backing table file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Excel workbook, first sheet; supports styled cells
    Xlsx,
    /// Comma-separated values; values only
    Csv,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("xlsx") => Some(TableFormat::Xlsx),
            Some("csv") => Some(TableFormat::Csv),
            _ => None,
        }
    }
}

/// Columns written by the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Result,
    Response,
}

impl Column {
    /// 0-based position in the case table
    pub const fn index(self) -> usize {
        match self {
            Column::Result => 11,
            Column::Response => 12,
        }
    }
}

/// RGB font colour applied to a verdict cell
pub fn verdict_color(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Pass => "00FF00",
        Verdict::Fail => "FF0000",
        Verdict::Skip => "800080",
    }
}

/// Read the raw cell grid of a table; row 0 is the first physical row
pub fn read_grid(path: &Path, format: TableFormat) -> Result<Vec<Vec<String>>> {
    match format {
        TableFormat::Xlsx => xlsx::read_grid(path),
        TableFormat::Csv => csv_table::read_grid(path),
    }
}

/// Destination for verdict records
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Persist one verdict into the row it belongs to
    async fn record(&self, row_index: usize, record: &VerdictRecord) -> Result<()>;
}

/// Sink for sources that are not written back (YAML documents)
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

#[async_trait]
impl ResultSink for Discard {
    async fn record(&self, _row_index: usize, _record: &VerdictRecord) -> Result<()> {
        Ok(())
    }
}

/// Writes verdicts back into a case table
#[derive(Debug, Clone)]
pub struct ResultWriter {
    path: PathBuf,
    format: TableFormat,
}

impl ResultWriter {
    pub fn new(path: impl Into<PathBuf>, format: TableFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Writer for a table path, choosing the format by extension
    pub fn for_path(path: &Path) -> Result<Self> {
        let format = TableFormat::from_path(path).ok_or_else(|| Error::UnsupportedSource {
            path: path.display().to_string(),
        })?;
        Ok(Self::new(path, format))
    }

    /// Write a single cell, optionally styled by verdict
    pub fn write_cell(
        &self,
        row: usize,
        column: Column,
        value: &str,
        style: Option<Verdict>,
    ) -> Result<()> {
        match self.format {
            TableFormat::Xlsx => xlsx::write_cell(&self.path, row, column.index(), value, style),
            TableFormat::Csv => csv_table::write_cell(&self.path, row, column.index(), value),
        }
    }

    /// Response column first, then the styled verdict
    fn write_record(&self, row_index: usize, record: &VerdictRecord) -> Result<()> {
        self.write_cell(row_index, Column::Response, &record.response_text, None)?;
        self.write_cell(
            row_index,
            Column::Result,
            record.verdict.as_str(),
            Some(record.verdict),
        )
    }
}

#[async_trait]
impl ResultSink for ResultWriter {
    async fn record(&self, row_index: usize, record: &VerdictRecord) -> Result<()> {
        // workbook I/O is synchronous; keep it off the runtime threads
        let writer = self.clone();
        let owned = record.clone();
        let written = tokio::task::spawn_blocking(move || writer.write_record(row_index, &owned))
            .await
            .unwrap_or_else(|e| Err(Error::write_back(&self.path, row_index, e)));

        match &written {
            Ok(()) => tracing::info!(
                case = %record.case_name,
                row = row_index,
                verdict = %record.verdict,
                "Result written"
            ),
            Err(e) => tracing::error!(
                case = %record.case_name,
                row = row_index,
                error = %e,
                "Failed to write result"
            ),
        }
        written
    }
}

/// Replace `path` with whatever `write` produces in a sibling temp file
fn replace_atomically<F>(path: &Path, row: usize, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let suffix = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    let tmp = tempfile::Builder::new()
        .prefix(".apicase-")
        .suffix(&suffix)
        .tempfile_in(dir)
        .map_err(|e| Error::write_back(path, row, e))?;

    write(tmp.path())?;

    if let Ok(meta) = std::fs::metadata(path) {
        // keep the table's permissions across the replace
        let _ = std::fs::set_permissions(tmp.path(), meta.permissions());
    }

    tmp.persist(path)
        .map_err(|e| Error::write_back(path, row, e.error))?;
    Ok(())
}
