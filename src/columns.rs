//! Column resolution via literal alias tables.
//!
//! Each semantic field owns an ordered list of header spellings. Matching is
//! exact and case-sensitive: single-letter markers such as `м`/`ж` collide
//! across languages, so no fuzzy or case-folding fallback happens here.
//! Supporting a new language means appending aliases.

use crate::rows::{Cell, RawRow};

pub const AGE_ALIASES: &[&str] = &["age", "Age", "AGE", "возраст", "Возраст", "ВОЗРАСТ"];

pub const MALE_ALIASES: &[&str] = &[
    "male",
    "males",
    "Male",
    "Males",
    "MALE",
    "MALES",
    "men",
    "Men",
    "m",
    "M",
    "мужчины",
    "Мужчины",
    "мужской",
    "Мужской",
    "муж",
    "м",
    "М",
];

pub const FEMALE_ALIASES: &[&str] = &[
    "female",
    "females",
    "Female",
    "Females",
    "FEMALE",
    "FEMALES",
    "women",
    "Women",
    "f",
    "F",
    "женщины",
    "Женщины",
    "женский",
    "Женский",
    "жен",
    "ж",
    "Ж",
];

pub const TOTAL_ALIASES: &[&str] = &[
    "total",
    "Total",
    "TOTAL",
    "population",
    "Population",
    "POPULATION",
    "value",
    "Value",
    "VALUE",
    "count",
    "Count",
    "COUNT",
    "всего",
    "Всего",
    "население",
    "Население",
    "численность",
    "Численность",
];

pub const YEAR_ALIASES: &[&str] = &["year", "Year", "YEAR", "год", "Год", "ГОД", "TIME_PERIOD"];

/// Column names of an SDMX/Eurostat export, compared case-insensitively.
pub const EUROSTAT_AGE: &str = "age";
pub const EUROSTAT_SEX: &str = "sex";
pub const EUROSTAT_GEO: &str = "geo";
pub const EUROSTAT_TIME: &str = "time_period";
pub const EUROSTAT_VALUE: &str = "obs_value";
pub const EUROSTAT_SIGNATURE: &[&str] = &[
    EUROSTAT_AGE,
    EUROSTAT_SEX,
    EUROSTAT_GEO,
    EUROSTAT_TIME,
    EUROSTAT_VALUE,
];

/// Returns the value of the first alias present in `row`.
pub fn resolve<'a>(row: &'a RawRow, aliases: &[&str]) -> Option<&'a Cell> {
    aliases.iter().find_map(|alias| row.get(alias))
}

/// Returns the first alias that appears verbatim among `headers`.
pub fn find_header<'a, S: AsRef<str>>(headers: &'a [S], aliases: &[&str]) -> Option<&'a str> {
    aliases.iter().find_map(|alias| {
        headers
            .iter()
            .map(AsRef::as_ref)
            .find(|header| header == alias)
    })
}

pub fn has_header<S: AsRef<str>>(headers: &[S], aliases: &[&str]) -> bool {
    find_header(headers, aliases).is_some()
}

/// Case-insensitive lookup; reserved for the Eurostat signature columns.
pub fn find_header_ignore_case<'a, S: AsRef<str>>(headers: &'a [S], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .map(AsRef::as_ref)
        .find(|header| header.trim().eq_ignore_ascii_case(name))
}
