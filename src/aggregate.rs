//! Custom age-group aggregation and its validation.
//!
//! Validation is a separate pure function: callers run
//! [`validate_age_groups`] first and decide whether to block. Aggregation
//! itself never fails; source groups outside every range are dropped.

use std::{fmt, str::FromStr};

use anyhow::{Context, Result, anyhow, bail};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::data::{PopulationAgeGroup, PopulationData};

pub const GROUPED_SUFFIX: &str = " (grouped)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeRangeConfig {
    pub id: String,
    pub from: i32,
    /// Inclusive upper bound; `None` is open-ended.
    pub to: Option<i32>,
    pub label: String,
}

impl AgeRangeConfig {
    pub fn new(from: i32, to: Option<i32>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            from,
            to,
            label: range_label(from, to),
        }
    }

    /// Parses the label syntax: `"20-29"`, `"65+"` or a single age `"5"`.
    pub fn parse(spec: &str) -> Result<Self> {
        let trimmed = spec.trim();
        if let Some(lower) = trimmed.strip_suffix('+') {
            let from = parse_bound(lower, trimmed)?;
            return Ok(Self::new(from, None));
        }
        match trimmed.split_once('-') {
            Some((lower, upper)) if !lower.trim().is_empty() => {
                let from = parse_bound(lower, trimmed)?;
                let to = parse_bound(upper, trimmed)?;
                Ok(Self::new(from, Some(to)))
            }
            _ => {
                let age = parse_bound(trimmed, trimmed)?;
                Ok(Self::new(age, Some(age)))
            }
        }
    }

    pub fn contains(&self, age: u32) -> bool {
        let age = i64::from(age);
        age >= i64::from(self.from) && self.to.is_none_or(|to| age <= i64::from(to))
    }
}

impl FromStr for AgeRangeConfig {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_bound(raw: &str, spec: &str) -> Result<i32> {
    raw.trim()
        .parse::<i32>()
        .with_context(|| format!("Invalid age range '{spec}'"))
}

pub fn range_label(from: i32, to: Option<i32>) -> String {
    match to {
        None => format!("{from}+"),
        Some(to) if to == from => from.to_string(),
        Some(to) => format!("{from}-{to}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AgeGroupError {
    #[error("At least one age group is required")]
    Empty,
    #[error("Age group {label}: lower bound {from} is greater than upper bound {to}")]
    InvertedRange { label: String, from: i32, to: i32 },
    #[error("Age group {label}: lower bound {from} is negative")]
    NegativeFrom { label: String, from: i32 },
    #[error("Age group {label} overlaps {previous}")]
    Overlap { label: String, previous: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeGroupValidation {
    pub valid: bool,
    pub errors: Vec<AgeGroupError>,
}

impl fmt::Display for AgeGroupValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            return f.write_str("valid");
        }
        f.write_str(&self.errors.iter().join("; "))
    }
}

fn sorted_by_from(ranges: &[AgeRangeConfig]) -> Vec<&AgeRangeConfig> {
    let mut sorted: Vec<&AgeRangeConfig> = ranges.iter().collect();
    sorted.sort_by_key(|range| range.from);
    sorted
}

/// Checks `ranges` and reports every problem found, not only the first.
/// `max_age` stands in for the upper bound of an open-ended range when
/// checking whether the next range overlaps it.
pub fn validate_age_groups(ranges: &[AgeRangeConfig], max_age: i32) -> AgeGroupValidation {
    let mut errors = Vec::new();
    if ranges.is_empty() {
        errors.push(AgeGroupError::Empty);
    }

    let mut previous: Option<&AgeRangeConfig> = None;
    for range in sorted_by_from(ranges) {
        if range.from < 0 {
            errors.push(AgeGroupError::NegativeFrom {
                label: range.label.clone(),
                from: range.from,
            });
        }
        if let Some(to) = range.to
            && range.from > to
        {
            errors.push(AgeGroupError::InvertedRange {
                label: range.label.clone(),
                from: range.from,
                to,
            });
        }
        if let Some(prev) = previous {
            // An open range covers at least its own start, even past max_age.
            let prev_upper = prev.to.unwrap_or(max_age.max(prev.from));
            if range.from <= prev_upper {
                errors.push(AgeGroupError::Overlap {
                    label: range.label.clone(),
                    previous: prev.label.clone(),
                });
            }
        }
        previous = Some(range);
    }

    AgeGroupValidation {
        valid: errors.is_empty(),
        errors,
    }
}

/// Regroups `data` into `ranges`. Each result group is labelled by its range
/// and keyed by the range's lower bound.
pub fn aggregate_by_age_groups(data: &PopulationData, ranges: &[AgeRangeConfig]) -> PopulationData {
    let age_groups = sorted_by_from(ranges)
        .into_iter()
        .map(|range| {
            let (male, female) = data
                .age_groups
                .iter()
                .filter(|group| range.contains(group.age_numeric))
                .fold((0.0, 0.0), |(m, f), group| (m + group.male, f + group.female));
            PopulationAgeGroup {
                age: range.label.clone(),
                age_numeric: u32::try_from(range.from).unwrap_or(0),
                male,
                female,
            }
        })
        .collect();
    PopulationData {
        title: grouped_title(&data.title),
        date: data.date.clone(),
        source: data.source.clone(),
        age_groups,
        has_gender_data: data.has_gender_data,
    }
}

fn grouped_title(title: &str) -> String {
    if title.ends_with(GROUPED_SUFFIX) {
        title.to_string()
    } else {
        format!("{title}{GROUPED_SUFFIX}")
    }
}

/// Parses several range specs, failing on the first malformed one.
pub fn parse_ranges<S: AsRef<str>>(specs: &[S]) -> Result<Vec<AgeRangeConfig>> {
    specs
        .iter()
        .map(|spec| spec.as_ref().parse::<AgeRangeConfig>())
        .collect()
}

/// Rejects a range list that fails validation, joining every problem.
pub fn ensure_valid(ranges: &[AgeRangeConfig], max_age: i32) -> Result<()> {
    let validation = validate_age_groups(ranges, max_age);
    if !validation.valid {
        bail!("Invalid age groups: {validation}");
    }
    Ok(())
}

/// Highest `age_numeric` in a dataset, used as the default `max_age`.
pub fn max_age_of(data: &PopulationData) -> Result<i32> {
    let max = data
        .age_groups
        .iter()
        .map(|g| g.age_numeric)
        .max()
        .unwrap_or(0);
    i32::try_from(max).map_err(|_| anyhow!("Age {max} out of range"))
}
