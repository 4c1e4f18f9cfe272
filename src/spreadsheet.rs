//! Spreadsheet reading via `calamine` (xlsx, xls, xlsm, xlsb, ods).
//!
//! Only the first worksheet is read; its first non-empty row is the header.

use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};
use log::debug;

use crate::{
    error::IngestError,
    rows::{Cell, RawRow, TabularReader},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetReader;

impl SpreadsheetReader {
    fn first_sheet(&self, path: &Path) -> Result<Range<Data>, IngestError> {
        let mut workbook = open_workbook_auto(path)?;
        let sheet_names = workbook.sheet_names().to_owned();
        debug!("Workbook {:?} has sheet(s) {:?}", path, sheet_names);
        match workbook.worksheet_range_at(0) {
            Some(range) => Ok(range?),
            None => Err(IngestError::Spreadsheet(format!(
                "Workbook {path:?} contains no worksheets"
            ))),
        }
    }
}

impl TabularReader for SpreadsheetReader {
    fn read_headers(&self, path: &Path) -> Result<Vec<String>, IngestError> {
        let range = self.first_sheet(path)?;
        Ok(range_headers(&range))
    }

    fn read_rows(&self, path: &Path) -> Result<Vec<RawRow>, IngestError> {
        let range = self.first_sheet(path)?;
        Ok(range_rows(&range))
    }

    fn read_table(&self, path: &Path) -> Result<(Vec<String>, Vec<RawRow>), IngestError> {
        let range = self.first_sheet(path)?;
        Ok((range_headers(&range), range_rows(&range)))
    }
}

fn is_empty_row(row: &[Data]) -> bool {
    row.iter().all(|cell| matches!(cell_value(cell), Cell::Empty))
}

pub fn range_headers(range: &Range<Data>) -> Vec<String> {
    range
        .rows()
        .find(|row| !is_empty_row(row))
        .map(|row| row.iter().map(header_text).collect())
        .unwrap_or_default()
}

pub fn range_rows(range: &Range<Data>) -> Vec<RawRow> {
    let mut rows = range.rows().skip_while(|row| is_empty_row(row));
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(header_text).collect(),
        None => return Vec::new(),
    };
    rows.filter(|row| !is_empty_row(row))
        .map(|row| {
            RawRow::from_pairs(
                headers
                    .iter()
                    .zip(row.iter())
                    .filter(|(header, _)| !header.is_empty())
                    .map(|(header, cell)| (header.clone(), cell_value(cell))),
            )
        })
        .filter(|row| !row.is_blank())
        .collect()
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => cell_value(other).as_display(),
    }
}

pub fn cell_value(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Boolean(*b),
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.trim().to_string()),
        Data::Error(_) => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}
