//! Stable error taxonomy for the ingestion pipeline.
//!
//! [`IngestError`] carries diagnostic detail for logs; [`ErrorCode`] is the
//! only thing that crosses the [`ParseResult`](crate::pipeline::ParseResult)
//! boundary so callers can localise messages without string matching.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AgeColumnNotFound,
    MaleColumnNotFound,
    FemaleColumnNotFound,
    TotalColumnNotFound,
    CsvParseError,
    ExcelParseError,
    UnknownFileFormat,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::AgeColumnNotFound => "AGE_COLUMN_NOT_FOUND",
            ErrorCode::MaleColumnNotFound => "MALE_COLUMN_NOT_FOUND",
            ErrorCode::FemaleColumnNotFound => "FEMALE_COLUMN_NOT_FOUND",
            ErrorCode::TotalColumnNotFound => "TOTAL_COLUMN_NOT_FOUND",
            ErrorCode::CsvParseError => "CSV_PARSE_ERROR",
            ErrorCode::ExcelParseError => "EXCEL_PARSE_ERROR",
            ErrorCode::UnknownFileFormat => "UNKNOWN_FILE_FORMAT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column names used when reporting a missing required column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredColumn {
    Age,
    Male,
    Female,
    Total,
}

impl fmt::Display for RequiredColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequiredColumn::Age => "age",
            RequiredColumn::Male => "male",
            RequiredColumn::Female => "female",
            RequiredColumn::Total => "total",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("No {column} column among headers {headers:?}")]
    MissingColumn {
        column: RequiredColumn,
        headers: Vec<String>,
    },
    #[error("Failed to parse delimited text: {0}")]
    Csv(String),
    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(String),
    #[error("Unsupported file extension {0:?}")]
    UnsupportedExtension(String),
}

impl IngestError {
    pub fn missing(column: RequiredColumn, headers: &[String]) -> Self {
        IngestError::MissingColumn {
            column,
            headers: headers.to_vec(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            IngestError::MissingColumn { column, .. } => match column {
                RequiredColumn::Age => ErrorCode::AgeColumnNotFound,
                RequiredColumn::Male => ErrorCode::MaleColumnNotFound,
                RequiredColumn::Female => ErrorCode::FemaleColumnNotFound,
                RequiredColumn::Total => ErrorCode::TotalColumnNotFound,
            },
            IngestError::Csv(_) => ErrorCode::CsvParseError,
            IngestError::Spreadsheet(_) => ErrorCode::ExcelParseError,
            IngestError::UnsupportedExtension(_) => ErrorCode::UnknownFileFormat,
        }
    }
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        IngestError::Csv(err.to_string())
    }
}

impl From<calamine::Error> for IngestError {
    fn from(err: calamine::Error) -> Self {
        IngestError::Spreadsheet(err.to_string())
    }
}
