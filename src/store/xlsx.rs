//! Excel workbook case tables
//!
//! Only the first worksheet is used. Grid rows and columns are 0-based;
//! the workbook's coordinates are 1-based `(column, row)` pairs.

use std::path::Path;

use umya_spreadsheet::{reader, writer};

use super::{replace_atomically, verdict_color};
use crate::common::{Error, Result};
use crate::verdict::Verdict;

fn coordinate(row: usize, col: usize) -> (u32, u32) {
    ((col + 1) as u32, (row + 1) as u32)
}

pub(super) fn read_grid(path: &Path) -> Result<Vec<Vec<String>>> {
    let book = reader::xlsx::read(path).map_err(|e| Error::Workbook {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let sheet = book.get_sheet(&0).ok_or_else(|| Error::Workbook {
        path: path.display().to_string(),
        reason: "workbook has no worksheets".to_string(),
    })?;

    let rows = sheet.get_highest_row() as usize;
    let cols = sheet.get_highest_column() as usize;

    let mut grid = Vec::with_capacity(rows);
    for row in 0..rows {
        let mut cells = Vec::with_capacity(cols);
        for col in 0..cols {
            cells.push(sheet.get_value(coordinate(row, col)));
        }
        grid.push(cells);
    }
    Ok(grid)
}

pub(super) fn write_cell(
    path: &Path,
    row: usize,
    col: usize,
    value: &str,
    style: Option<Verdict>,
) -> Result<()> {
    let mut book = reader::xlsx::read(path).map_err(|e| Error::write_back(path, row, e))?;
    let sheet = book
        .get_sheet_mut(&0)
        .ok_or_else(|| Error::write_back(path, row, "workbook has no worksheets"))?;

    let cell = sheet.get_cell_mut(coordinate(row, col));
    cell.set_value_string(value);
    if let Some(verdict) = style {
        let font = cell.get_style_mut().get_font_mut();
        font.set_bold(true);
        font.get_color_mut()
            .set_argb(format!("FF{}", verdict_color(verdict)));
    }

    replace_atomically(path, row, |tmp| {
        writer::xlsx::write(&book, tmp).map_err(|e| Error::write_back(path, row, e))
    })
}
