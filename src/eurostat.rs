//! Eurostat / SDMX CSV exports.
//!
//! Exports carry one row per (sex, age, geo, year) observation, with coded
//! ages such as `Y0`, `Y_LT1`, `Y_GE100` and aggregate rows (`TOTAL`, `UNK`,
//! sex `T`) mixed in. Aggregate rows are dropped before any summation.
//!
//! Only the first row's `geo` is kept as the series' country code. Files
//! mixing several countries are still summed across all rows; a warning
//! names the extra codes.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::LazyLock,
};

use itertools::Itertools;
use log::{debug, warn};
use regex::Regex;

use crate::{
    columns::{
        EUROSTAT_AGE, EUROSTAT_GEO, EUROSTAT_SEX, EUROSTAT_TIME, EUROSTAT_VALUE,
        find_header_ignore_case,
    },
    data::{PopulationAgeGroup, PopulationData, TimeSeriesPopulationData},
    error::{IngestError, RequiredColumn},
    normalize::{Normalized, parse_number},
    rows::{Cell, RawRow},
};

pub const EUROSTAT_SOURCE: &str = "Eurostat";

static OPEN_ENDED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Y_GE([0-9]+)$").expect("open-ended age pattern is valid"));
static SINGLE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Y([0-9]+)$").expect("single-year age pattern is valid"));
static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit run pattern is valid"));

/// Decoded Eurostat age token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgeToken {
    Age { label: String, age_numeric: u32 },
    /// `TOTAL`, `UNK` or an unparseable token; the row must be excluded.
    Skip,
}

pub fn decode_age_token(token: &str) -> AgeToken {
    let token = token.trim();
    if token.eq_ignore_ascii_case("TOTAL") || token.eq_ignore_ascii_case("UNK") {
        return AgeToken::Skip;
    }
    if token == "Y_LT1" {
        return age(0, "0".to_string());
    }
    if let Some(n) = capture_number(&OPEN_ENDED, token) {
        return age(n, format!("{n}+"));
    }
    if let Some(n) = capture_number(&SINGLE_YEAR, token) {
        return age(n, n.to_string());
    }
    match DIGIT_RUN
        .find(token)
        .and_then(|m| m.as_str().parse::<u32>().ok())
    {
        Some(n) => age(n, n.to_string()),
        None => AgeToken::Skip,
    }
}

fn age(age_numeric: u32, label: String) -> AgeToken {
    AgeToken::Age { label, age_numeric }
}

fn capture_number(pattern: &Regex, token: &str) -> Option<u32> {
    pattern
        .captures(token)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sex {
    Male,
    Female,
}

fn decode_sex(cell: Option<&Cell>) -> Option<Sex> {
    match cell.map(Cell::as_display).as_deref().map(str::trim) {
        Some("M") | Some("m") => Some(Sex::Male),
        Some("F") | Some("f") => Some(Sex::Female),
        _ => None,
    }
}

struct Columns<'a> {
    age: &'a str,
    sex: &'a str,
    geo: Option<&'a str>,
    time: Option<&'a str>,
    value: &'a str,
}

fn resolve_columns(headers: &[String]) -> Result<Columns<'_>, IngestError> {
    let missing = |column| IngestError::missing(column, headers);
    Ok(Columns {
        age: find_header_ignore_case(headers, EUROSTAT_AGE)
            .ok_or_else(|| missing(RequiredColumn::Age))?,
        sex: find_header_ignore_case(headers, EUROSTAT_SEX)
            .ok_or_else(|| missing(RequiredColumn::Male))?,
        geo: find_header_ignore_case(headers, EUROSTAT_GEO),
        time: find_header_ignore_case(headers, EUROSTAT_TIME),
        value: find_header_ignore_case(headers, EUROSTAT_VALUE)
            .ok_or_else(|| missing(RequiredColumn::Total))?,
    })
}

pub fn validate_columns(headers: &[String]) -> Result<(), IngestError> {
    resolve_columns(headers).map(|_| ())
}

pub fn normalize_eurostat(
    headers: &[String],
    rows: &[RawRow],
    title: &str,
) -> Result<Normalized, IngestError> {
    let columns = resolve_columns(headers)?;

    let geo_code = columns
        .geo
        .and_then(|geo| rows.first().and_then(|row| row.get(geo)))
        .map(Cell::as_display)
        .filter(|code| !code.is_empty());

    let mut geos = BTreeSet::new();
    let mut by_year: BTreeMap<i32, HashMap<String, PopulationAgeGroup>> = BTreeMap::new();
    let mut skipped = 0usize;

    for row in rows {
        if let Some(geo) = columns.geo.and_then(|geo| row.get(geo)) {
            geos.insert(geo.as_display());
        }
        let Some(sex) = decode_sex(row.get(columns.sex)) else {
            skipped += 1;
            continue;
        };
        let token = row.get(columns.age).map(Cell::as_display).unwrap_or_default();
        let AgeToken::Age { label, age_numeric } = decode_age_token(&token) else {
            skipped += 1;
            continue;
        };
        let year = match columns.time {
            Some(time) => match row.get(time).and_then(Cell::as_year) {
                Some(year) => year,
                None => {
                    skipped += 1;
                    continue;
                }
            },
            None => 0,
        };
        let value = parse_number(row.get(columns.value));
        let group = by_year
            .entry(year)
            .or_default()
            .entry(label.clone())
            .or_insert_with(|| PopulationAgeGroup::new(label, age_numeric, 0.0, 0.0));
        match sex {
            Sex::Male => group.male += value,
            Sex::Female => group.female += value,
        }
    }

    debug!(
        "Eurostat rows: {} kept, {} skipped (totals, unknown ages or unusable years)",
        rows.len() - skipped,
        skipped
    );
    if geos.len() > 1 {
        warn!(
            "Eurostat file mixes {} geo codes ({}); summing all rows under {}",
            geos.len(),
            geos.iter().join(", "),
            geo_code.as_deref().unwrap_or("?")
        );
    }

    let buckets: BTreeMap<i32, Vec<PopulationAgeGroup>> = by_year
        .into_iter()
        .map(|(year, groups)| {
            let mut groups: Vec<PopulationAgeGroup> = groups.into_values().collect();
            groups.sort_by(|a, b| {
                a.age_numeric
                    .cmp(&b.age_numeric)
                    .then_with(|| a.age.cmp(&b.age))
            });
            (year, groups)
        })
        .collect();

    let series = TimeSeriesPopulationData {
        source: Some(EUROSTAT_SOURCE.to_string()),
        geo_code,
        ..TimeSeriesPopulationData::from_buckets(title, buckets)
    };
    let data = series.latest_snapshot().unwrap_or_else(|| PopulationData {
        source: series.source.clone(),
        ..PopulationData::new(title, Vec::new())
    });
    Ok(Normalized {
        data,
        time_series: Some(series),
    })
}
