//! Delimited-text reading: encoding, delimiter resolution and raw rows.
//!
//! Input bytes are decoded up front via `encoding_rs` (defaulting to UTF-8,
//! BOM stripped), then fed through a `csv::Reader`. When no delimiter is
//! supplied it is sniffed from the header line so that `;`-separated exports
//! with decimal commas parse without extra flags.

use std::{fs, io::Read, path::Path};

use anyhow::{Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::{
    error::IngestError,
    rows::{Cell, RawRow, TabularReader},
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';
const SNIFF_CANDIDATES: [u8; 3] = [b';', b'\t', b','];

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

/// Picks the candidate delimiter occurring most often in `header_line`.
/// Ties resolve in favour of `;`, then tab, then `,`.
pub fn sniff_delimiter(header_line: &str, path: &Path) -> u8 {
    let mut best = None;
    let mut best_count = 0usize;
    for candidate in SNIFF_CANDIDATES {
        let count = header_line.bytes().filter(|b| *b == candidate).count();
        if count > best_count {
            best = Some(candidate);
            best_count = count;
        }
    }
    best.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String, IngestError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(IngestError::Csv(format!(
            "Failed to decode text with encoding {}",
            encoding.name()
        )))
    } else {
        Ok(text.into_owned())
    }
}

fn first_line(text: &str) -> &str {
    text.lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy)]
pub struct CsvReader {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for CsvReader {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

impl CsvReader {
    pub fn new(delimiter: Option<u8>, encoding: &'static Encoding) -> Self {
        Self {
            delimiter,
            encoding,
        }
    }

    fn load_text(&self, path: &Path) -> Result<String, IngestError> {
        let bytes = fs::read(path)
            .map_err(|err| IngestError::Csv(format!("Opening input file {path:?}: {err}")))?;
        decode_bytes(&bytes, self.encoding)
    }

    fn resolve_delimiter(&self, text: &str, path: &Path) -> u8 {
        let delimiter = self
            .delimiter
            .unwrap_or_else(|| sniff_delimiter(first_line(text), path));
        debug!(
            "Reading {:?} with delimiter '{}'",
            path,
            crate::printable_delimiter(delimiter)
        );
        delimiter
    }

    /// Parses already-decoded text; exposed so callers holding bytes in
    /// memory can skip the filesystem.
    pub fn rows_from_text(&self, text: &str, path: &Path) -> Result<Vec<RawRow>, IngestError> {
        let delimiter = self.resolve_delimiter(text, path);
        let mut reader = open_csv_reader(text.as_bytes(), delimiter);
        let headers = clean_headers(reader.headers()?.iter());
        let mut rows = Vec::new();
        for (row_idx, record) in reader.records().enumerate() {
            let record = record
                .map_err(|err| IngestError::Csv(format!("Reading row {}: {err}", row_idx + 2)))?;
            let row = RawRow::from_pairs(
                headers
                    .iter()
                    .zip(record.iter())
                    .filter(|(header, _)| !header.is_empty())
                    .map(|(header, field)| (header.clone(), Cell::from_text(field))),
            );
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }
        Ok(rows)
    }

    pub fn headers_from_text(&self, text: &str, path: &Path) -> Result<Vec<String>, IngestError> {
        let delimiter = self.resolve_delimiter(text, path);
        let mut reader = open_csv_reader(text.as_bytes(), delimiter);
        Ok(clean_headers(reader.headers()?.iter()))
    }
}

impl TabularReader for CsvReader {
    fn read_headers(&self, path: &Path) -> Result<Vec<String>, IngestError> {
        let text = self.load_text(path)?;
        self.headers_from_text(&text, path)
    }

    fn read_rows(&self, path: &Path) -> Result<Vec<RawRow>, IngestError> {
        let text = self.load_text(path)?;
        self.rows_from_text(&text, path)
    }

    fn read_table(&self, path: &Path) -> Result<(Vec<String>, Vec<RawRow>), IngestError> {
        let text = self.load_text(path)?;
        Ok((
            self.headers_from_text(&text, path)?,
            self.rows_from_text(&text, path)?,
        ))
    }
}

fn clean_headers<'a, I>(raw: I) -> Vec<String>
where
    I: Iterator<Item = &'a str>,
{
    raw.map(|header| header.trim_start_matches('\u{feff}').trim().to_string())
        .collect()
}
