//! File-to-model orchestration.
//!
//! [`parse_population_file_with`] drives one ingestion through
//! `reading → detecting → validating → building → done`, reporting each step
//! to a [`ProgressSink`]. Failures never escape as errors: they are folded
//! into [`ParseResult::Failure`] carrying a stable [`ErrorCode`].

use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    data::{PopulationData, TimeSeriesPopulationData},
    error::{ErrorCode, IngestError},
    format::{Container, DataFormat, detect_from_headers, detect_spreadsheet_headers},
    io_utils::CsvReader,
    normalize::{self, normalize_rows, title_from_path},
    progress::{NoProgress, ProgressSink, ProgressTracker, Stage},
    rows::{RawRow, TabularReader},
    spreadsheet::SpreadsheetReader,
};

#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// Explicit delimiter for delimited text; sniffed when `None`.
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

impl IngestOptions {
    fn reader(&self, container: Container) -> Box<dyn TabularReader> {
        match container {
            Container::Delimited => Box::new(CsvReader::new(self.delimiter, self.encoding)),
            Container::Spreadsheet => Box::new(SpreadsheetReader),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPopulation {
    pub data: PopulationData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_series_data: Option<TimeSeriesPopulationData>,
    pub detected_format: DataFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ParseResult {
    Success(ParsedPopulation),
    Failure { error: ErrorCode },
}

impl ParseResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ParseResult::Success(_))
    }

    pub fn error(&self) -> Option<ErrorCode> {
        match self {
            ParseResult::Success(_) => None,
            ParseResult::Failure { error } => Some(*error),
        }
    }
}

pub fn detect_format(path: &Path) -> DataFormat {
    detect_format_with(path, &IngestOptions::default())
}

/// Classifies `path` without normalizing it. Never fails: unreadable
/// delimited files report `unknown`, unreadable spreadsheets `simple`.
pub fn detect_format_with(path: &Path, options: &IngestOptions) -> DataFormat {
    let Some(container) = Container::from_path(path) else {
        debug!("No reader for {path:?}; format unknown");
        return DataFormat::Unknown;
    };
    match options.reader(container).read_headers(path) {
        Ok(headers) => classify(container, &headers),
        Err(err) => match container {
            Container::Delimited => {
                warn!("Could not read header row of {path:?}: {err}");
                DataFormat::Unknown
            }
            Container::Spreadsheet => {
                warn!("Could not read spreadsheet {path:?}: {err}; assuming simple");
                DataFormat::Simple
            }
        },
    }
}

fn classify(container: Container, headers: &[String]) -> DataFormat {
    match container {
        Container::Delimited => detect_from_headers(headers),
        Container::Spreadsheet => {
            let format = detect_spreadsheet_headers(headers);
            if headers.is_empty() {
                warn!("Spreadsheet has no header row; assuming {format}");
            } else if format == DataFormat::Simple
                && detect_from_headers(headers) == DataFormat::Unknown
            {
                warn!("Unrecognised spreadsheet headers {headers:?}; assuming {format}");
            }
            format
        }
    }
}

pub fn parse_population_file(path: &Path) -> ParseResult {
    parse_population_file_with(path, &IngestOptions::default(), &mut NoProgress)
}

pub fn parse_population_file_with(
    path: &Path,
    options: &IngestOptions,
    sink: &mut dyn ProgressSink,
) -> ParseResult {
    let mut tracker = ProgressTracker::new(sink);
    match run_stages(path, options, &mut tracker) {
        Ok(parsed) => {
            tracker.advance(Stage::Done);
            debug!(
                "Parsed {:?} as {} with {} age group(s)",
                path,
                parsed.detected_format,
                parsed.data.age_groups.len()
            );
            ParseResult::Success(parsed)
        }
        Err(err) => {
            let code = err.code();
            warn!("Failed to ingest {path:?}: {err}");
            tracker.fail(code);
            ParseResult::Failure { error: code }
        }
    }
}

fn run_stages(
    path: &Path,
    options: &IngestOptions,
    tracker: &mut ProgressTracker<'_>,
) -> Result<ParsedPopulation, IngestError> {
    tracker.advance(Stage::Reading);
    let container = Container::from_path(path).ok_or_else(|| {
        IngestError::UnsupportedExtension(
            path.extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_default(),
        )
    })?;
    let (headers, rows): (Vec<String>, Vec<RawRow>) =
        options.reader(container).read_table(path)?;
    debug!("Read {} row(s) under {} header(s)", rows.len(), headers.len());

    tracker.advance(Stage::Detecting);
    let detected_format = classify(container, &headers);

    tracker.advance(Stage::Validating);
    normalize::validate_columns(&headers, detected_format)?;

    tracker.advance(Stage::Building);
    let normalized = normalize_rows(&headers, &rows, detected_format, &title_from_path(path))?;

    Ok(ParsedPopulation {
        data: normalized.data,
        time_series_data: normalized.time_series,
        detected_format,
    })
}

/// Ticket identifying one ingestion started on an [`IngestSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Applied,
    /// A newer ingestion began after this one; the result was not stored.
    Superseded(ParseResult),
}

/// Holds the dataset currently loaded by a caller and ensures only the most
/// recently started ingestion can replace it.
#[derive(Debug, Default)]
pub struct IngestSession {
    generation: u64,
    current: Option<ParsedPopulation>,
    last_error: Option<ErrorCode>,
}

impl IngestSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> IngestTicket {
        self.generation += 1;
        IngestTicket(self.generation)
    }

    pub fn complete(&mut self, ticket: IngestTicket, result: ParseResult) -> Completion {
        if ticket.0 != self.generation {
            debug!(
                "Discarding result of ingestion #{} (current #{})",
                ticket.0, self.generation
            );
            return Completion::Superseded(result);
        }
        match result {
            ParseResult::Success(parsed) => {
                self.current = Some(parsed);
                self.last_error = None;
            }
            ParseResult::Failure { error } => {
                self.current = None;
                self.last_error = Some(error);
            }
        }
        Completion::Applied
    }

    /// Starts and completes an ingestion of `path` in one call.
    pub fn load(
        &mut self,
        path: &Path,
        options: &IngestOptions,
        sink: &mut dyn ProgressSink,
    ) -> Completion {
        let ticket = self.begin();
        let result = parse_population_file_with(path, options, sink);
        self.complete(ticket, result)
    }

    pub fn current(&self) -> Option<&ParsedPopulation> {
        self.current.as_ref()
    }

    pub fn last_error(&self) -> Option<ErrorCode> {
        self.last_error
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.last_error = None;
    }
}
