//! Data format classification from a header row.

use std::{fmt, path::Path, str::FromStr};

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::columns::{
    self, AGE_ALIASES, EUROSTAT_SIGNATURE, FEMALE_ALIASES, MALE_ALIASES, TOTAL_ALIASES,
    YEAR_ALIASES,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataFormat {
    Simple,
    SimpleTotal,
    Timeseries,
    TimeseriesTotal,
    Eurostat,
    Unknown,
}

impl DataFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DataFormat::Simple => "simple",
            DataFormat::SimpleTotal => "simple-total",
            DataFormat::Timeseries => "timeseries",
            DataFormat::TimeseriesTotal => "timeseries-total",
            DataFormat::Eurostat => "eurostat",
            DataFormat::Unknown => "unknown",
        }
    }

    pub fn is_total_only(self) -> bool {
        matches!(self, DataFormat::SimpleTotal | DataFormat::TimeseriesTotal)
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "simple" => Ok(DataFormat::Simple),
            "simple-total" => Ok(DataFormat::SimpleTotal),
            "timeseries" => Ok(DataFormat::Timeseries),
            "timeseries-total" => Ok(DataFormat::TimeseriesTotal),
            "eurostat" => Ok(DataFormat::Eurostat),
            "unknown" => Ok(DataFormat::Unknown),
            other => Err(anyhow!("Unknown data format '{other}'")),
        }
    }
}

/// Physical container of an input file, decided by extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Delimited,
    Spreadsheet,
}

impl Container {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|ext| ext.to_str())?;
        if ["csv", "tsv", "txt"]
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
        {
            Some(Container::Delimited)
        } else if ["xlsx", "xls", "xlsm", "xlsb", "ods"]
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
        {
            Some(Container::Spreadsheet)
        } else {
            None
        }
    }
}

fn is_eurostat<S: AsRef<str>>(headers: &[S]) -> bool {
    EUROSTAT_SIGNATURE
        .iter()
        .all(|name| columns::find_header_ignore_case(headers, name).is_some())
}

/// Classifies a delimited-text header row. Gendered signatures are checked
/// before total-only ones because a gendered file may also carry a `total`.
pub fn detect_from_headers<S: AsRef<str>>(headers: &[S]) -> DataFormat {
    if is_eurostat(headers) {
        return DataFormat::Eurostat;
    }
    let has_age = columns::has_header(headers, AGE_ALIASES);
    let has_year = columns::has_header(headers, YEAR_ALIASES);
    let has_male = columns::has_header(headers, MALE_ALIASES);
    let has_female = columns::has_header(headers, FEMALE_ALIASES);
    let has_total = columns::has_header(headers, TOTAL_ALIASES);

    if has_year && has_age && has_male && has_female {
        DataFormat::Timeseries
    } else if has_age && has_male && has_female {
        DataFormat::Simple
    } else if has_year && has_age && has_total {
        DataFormat::TimeseriesTotal
    } else if has_age && has_total {
        DataFormat::SimpleTotal
    } else {
        DataFormat::Unknown
    }
}

/// Spreadsheets only distinguish `simple` from `simple-total`; anything
/// unrecognised falls back to `simple` and lets normalization report the
/// missing column.
pub fn detect_spreadsheet_headers<S: AsRef<str>>(headers: &[S]) -> DataFormat {
    let has_age = columns::has_header(headers, AGE_ALIASES);
    let has_male = columns::has_header(headers, MALE_ALIASES);
    let has_female = columns::has_header(headers, FEMALE_ALIASES);
    let has_total = columns::has_header(headers, TOTAL_ALIASES);
    if has_age && !(has_male && has_female) && has_total {
        DataFormat::SimpleTotal
    } else {
        DataFormat::Simple
    }
}
