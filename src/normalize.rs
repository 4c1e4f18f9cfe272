//! Raw rows to canonical model.
//!
//! Two failure policies live here side by side:
//!
//! - **File level, strict.** A required column absent from the header row is
//!   fatal and reported through [`IngestError::MissingColumn`].
//! - **Cell level, lenient.** Unparseable counts become `0` and unparseable
//!   age labels become bucket `0`; the row is kept. [`parse_number`] and
//!   [`parse_age_numeric`] are therefore infallible.

use std::{
    collections::BTreeMap,
    path::Path,
    sync::LazyLock,
};

use log::debug;
use regex::Regex;

use crate::{
    columns::{self, AGE_ALIASES, FEMALE_ALIASES, MALE_ALIASES, TOTAL_ALIASES, YEAR_ALIASES},
    data::{PopulationAgeGroup, PopulationData, TimeSeriesPopulationData},
    error::{IngestError, RequiredColumn},
    eurostat,
    format::DataFormat,
    rows::{Cell, RawRow},
};

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit run pattern is valid"));

/// Canonical output of one normalization run.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// The sole snapshot, or the latest year of a time series.
    pub data: PopulationData,
    pub time_series: Option<TimeSeriesPopulationData>,
}

/// First run of digits in `label`; `0` when there is none.
pub fn parse_age_numeric(label: &str) -> u32 {
    DIGIT_RUN
        .find(label)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(0)
}

/// Lenient count parsing: numbers pass through as absolute values, text is
/// stripped of whitespace with `,` read as the decimal separator, anything
/// else is `0`.
pub fn parse_number(cell: Option<&Cell>) -> f64 {
    let value = match cell {
        Some(Cell::Number(n)) => *n,
        Some(Cell::Text(s)) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| if c == ',' { '.' } else { c })
                .collect();
            cleaned.parse::<f64>().unwrap_or(0.0)
        }
        Some(Cell::Boolean(_)) | Some(Cell::Empty) | None => 0.0,
    };
    if value.is_finite() { value.abs() } else { 0.0 }
}

pub fn age_label(cell: Option<&Cell>) -> String {
    cell.map(Cell::as_display).unwrap_or_default()
}

/// Splits a total into `(male, female)` so that `male + female == total`.
pub fn split_total(total: f64) -> (f64, f64) {
    let male = (total / 2.0).round();
    (male, total - male)
}

/// File name without its extension.
pub fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn require_column<'a>(
    headers: &'a [String],
    aliases: &[&str],
    column: RequiredColumn,
) -> Result<&'a str, IngestError> {
    columns::find_header(headers, aliases).ok_or_else(|| IngestError::missing(column, headers))
}

/// File-level column check for `format`, run once before any row is read.
pub fn validate_columns(headers: &[String], format: DataFormat) -> Result<(), IngestError> {
    match format {
        DataFormat::Eurostat => eurostat::validate_columns(headers),
        DataFormat::Unknown => check_columns(headers, DataFormat::Simple),
        other => check_columns(headers, other),
    }
}

fn check_columns(headers: &[String], format: DataFormat) -> Result<(), IngestError> {
    require_column(headers, AGE_ALIASES, RequiredColumn::Age)?;
    if format.is_total_only() {
        require_column(headers, TOTAL_ALIASES, RequiredColumn::Total)?;
    } else {
        require_column(headers, MALE_ALIASES, RequiredColumn::Male)?;
        require_column(headers, FEMALE_ALIASES, RequiredColumn::Female)?;
    }
    Ok(())
}

fn row_to_group(row: &RawRow, total_only: bool) -> PopulationAgeGroup {
    let age = age_label(columns::resolve(row, AGE_ALIASES));
    let age_numeric = parse_age_numeric(&age);
    let (male, female) = if total_only {
        split_total(parse_number(columns::resolve(row, TOTAL_ALIASES)))
    } else {
        (
            parse_number(columns::resolve(row, MALE_ALIASES)),
            parse_number(columns::resolve(row, FEMALE_ALIASES)),
        )
    };
    PopulationAgeGroup {
        age,
        age_numeric,
        male,
        female,
    }
}

fn sort_groups(groups: &mut [PopulationAgeGroup]) {
    groups.sort_by_key(|g| g.age_numeric);
}

/// Normalizes `rows` read from a file whose header row is `headers`.
///
/// `Unknown` is normalized as `simple`, so an unrecognised file fails with
/// the first missing gendered column rather than a generic error.
pub fn normalize_rows(
    headers: &[String],
    rows: &[RawRow],
    format: DataFormat,
    title: &str,
) -> Result<Normalized, IngestError> {
    match format {
        DataFormat::Eurostat => eurostat::normalize_eurostat(headers, rows, title),
        DataFormat::Simple | DataFormat::SimpleTotal | DataFormat::Unknown => {
            let format = if format == DataFormat::Unknown {
                DataFormat::Simple
            } else {
                format
            };
            check_columns(headers, format)?;
            Ok(Normalized {
                data: normalize_snapshot(rows, format.is_total_only(), title),
                time_series: None,
            })
        }
        DataFormat::Timeseries | DataFormat::TimeseriesTotal => {
            check_columns(headers, format)?;
            let series = normalize_series(rows, format.is_total_only(), title);
            let data = series.latest_snapshot().unwrap_or_else(|| PopulationData {
                has_gender_data: series.has_gender_data,
                ..PopulationData::new(title, Vec::new())
            });
            Ok(Normalized {
                data,
                time_series: Some(series),
            })
        }
    }
}

fn normalize_snapshot(rows: &[RawRow], total_only: bool, title: &str) -> PopulationData {
    let mut groups: Vec<PopulationAgeGroup> =
        rows.iter().map(|row| row_to_group(row, total_only)).collect();
    sort_groups(&mut groups);
    PopulationData {
        has_gender_data: total_only.then_some(false),
        ..PopulationData::new(title, groups)
    }
}

fn normalize_series(rows: &[RawRow], total_only: bool, title: &str) -> TimeSeriesPopulationData {
    let mut buckets: BTreeMap<i32, Vec<PopulationAgeGroup>> = BTreeMap::new();
    for (row_idx, row) in rows.iter().enumerate() {
        let Some(year) = columns::resolve(row, YEAR_ALIASES).and_then(Cell::as_year) else {
            debug!("Skipping row {} without a usable year", row_idx + 2);
            continue;
        };
        buckets
            .entry(year)
            .or_default()
            .push(row_to_group(row, total_only));
    }
    for groups in buckets.values_mut() {
        sort_groups(groups);
    }
    TimeSeriesPopulationData {
        has_gender_data: total_only.then_some(false),
        ..TimeSeriesPopulationData::from_buckets(title, buckets)
    }
}
