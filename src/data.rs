//! Canonical population model shared by every input format.
//!
//! All values are immutable once built; helpers that "modify" a dataset
//! return a new one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationAgeGroup {
    pub age: String,
    pub age_numeric: u32,
    pub male: f64,
    pub female: f64,
}

impl PopulationAgeGroup {
    pub fn new(age: impl Into<String>, age_numeric: u32, male: f64, female: f64) -> Self {
        Self {
            age: age.into(),
            age_numeric,
            male,
            female,
        }
    }

    pub fn total(&self) -> f64 {
        self.male + self.female
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationData {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub age_groups: Vec<PopulationAgeGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_gender_data: Option<bool>,
}

impl PopulationData {
    pub fn new(title: impl Into<String>, age_groups: Vec<PopulationAgeGroup>) -> Self {
        Self {
            title: title.into(),
            date: None,
            source: None,
            age_groups,
            has_gender_data: None,
        }
    }

    /// `false` only when the source had no sex split and counts were derived.
    pub fn has_gender_split(&self) -> bool {
        self.has_gender_data.unwrap_or(true)
    }

    /// Largest single male or female count, the natural axis bound of a pyramid.
    pub fn max_value(&self) -> f64 {
        max_count(&self.age_groups)
    }

    pub fn to_percentages(&self) -> PopulationData {
        let grand_total = stats::totals(&self.age_groups).total;
        let age_groups = self
            .age_groups
            .iter()
            .map(|group| PopulationAgeGroup {
                age: group.age.clone(),
                age_numeric: group.age_numeric,
                male: stats::to_percent(group.male, grand_total),
                female: stats::to_percent(group.female, grand_total),
            })
            .collect();
        PopulationData {
            age_groups,
            ..self.clone()
        }
    }

    pub fn compact(&self) -> CompactPopulation {
        CompactPopulation {
            title: self.title.clone(),
            date: self.date.clone(),
            source: self.source.clone(),
            has_gender_data: self.has_gender_data,
            groups: self
                .age_groups
                .iter()
                .map(|g| (g.age_numeric, g.male, g.female))
                .collect(),
        }
    }
}

/// Tuple form `[ageNumeric, male, female]` used for compact transport.
/// Counts survive a round trip exactly; labels are rebuilt from the number,
/// so labels like `"85+"` or `"20-29"` come back as `"85"` / `"20"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactPopulation {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_gender_data: Option<bool>,
    pub groups: Vec<(u32, f64, f64)>,
}

impl CompactPopulation {
    pub fn expand(&self) -> PopulationData {
        PopulationData {
            title: self.title.clone(),
            date: self.date.clone(),
            source: self.source.clone(),
            has_gender_data: self.has_gender_data,
            age_groups: self
                .groups
                .iter()
                .map(|(age_numeric, male, female)| {
                    PopulationAgeGroup::new(age_numeric.to_string(), *age_numeric, *male, *female)
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPopulationData {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_code: Option<String>,
    pub years: Vec<i32>,
    pub data_by_year: BTreeMap<i32, Vec<PopulationAgeGroup>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_gender_data: Option<bool>,
}

impl TimeSeriesPopulationData {
    /// Builds the series from per-year buckets; `years` is derived from the
    /// map keys so the two can never disagree.
    pub fn from_buckets(
        title: impl Into<String>,
        data_by_year: BTreeMap<i32, Vec<PopulationAgeGroup>>,
    ) -> Self {
        let years = data_by_year.keys().copied().collect();
        Self {
            title: title.into(),
            source: None,
            geo_code: None,
            years,
            data_by_year,
            has_gender_data: None,
        }
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.years.last().copied()
    }

    pub fn snapshot(&self, year: i32) -> Option<PopulationData> {
        let groups = self.data_by_year.get(&year)?;
        Some(PopulationData {
            title: self.title.clone(),
            date: Some(year.to_string()),
            source: self.source.clone(),
            age_groups: groups.clone(),
            has_gender_data: self.has_gender_data,
        })
    }

    pub fn latest_snapshot(&self) -> Option<PopulationData> {
        self.latest_year().and_then(|year| self.snapshot(year))
    }

    /// Largest count over every year, for a fixed axis across an animation.
    pub fn max_value(&self) -> f64 {
        self.data_by_year
            .values()
            .map(|groups| max_count(groups))
            .fold(0.0, f64::max)
    }
}

fn max_count(groups: &[PopulationAgeGroup]) -> f64 {
    groups
        .iter()
        .map(|g| g.male.max(g.female))
        .fold(0.0, f64::max)
}
