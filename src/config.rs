//! Age-range configuration: YAML groups files and built-in presets.
//!
//! A groups file lists ranges by their bounds:
//!
//! ```yaml
//! groups:
//!   - from: 0
//!     to: 14
//!   - from: 15
//!     to: 64
//!   - from: 65
//! ```
//!
//! An omitted `to` is open-ended. `label` may override the derived label.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::aggregate::AgeRangeConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct GroupsFile {
    groups: Vec<GroupEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct GroupEntry {
    from: i32,
    #[serde(default)]
    to: Option<i32>,
    #[serde(default)]
    label: Option<String>,
}

impl GroupEntry {
    fn into_range(self) -> AgeRangeConfig {
        let mut range = AgeRangeConfig::new(self.from, self.to);
        if let Some(label) = self.label.filter(|label| !label.trim().is_empty()) {
            range.label = label;
        }
        range
    }
}

pub fn load_age_ranges(path: &Path) -> Result<Vec<AgeRangeConfig>> {
    let file = File::open(path).with_context(|| format!("Opening groups file {path:?}"))?;
    let reader = BufReader::new(file);
    let parsed: GroupsFile = serde_yaml::from_reader(reader)
        .with_context(|| format!("Parsing groups YAML {path:?}"))?;
    ranges_from_file(parsed)
}

pub fn parse_age_ranges(yaml: &str) -> Result<Vec<AgeRangeConfig>> {
    let parsed: GroupsFile = serde_yaml::from_str(yaml).context("Parsing groups YAML")?;
    ranges_from_file(parsed)
}

fn ranges_from_file(parsed: GroupsFile) -> Result<Vec<AgeRangeConfig>> {
    if parsed.groups.is_empty() {
        bail!("Groups file defines no age groups");
    }
    Ok(parsed
        .groups
        .into_iter()
        .map(GroupEntry::into_range)
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum AgePreset {
    /// 0-14, 15-64, 65+
    Broad,
    /// 0-4, 5-9, ... 95-99, 100+
    FiveYear,
    /// 0-9, 10-19, ... 90-99, 100+
    TenYear,
    /// 0-17, 18-64, 65-79, 80+
    LifeStages,
}

impl AgePreset {
    pub fn ranges(self) -> Vec<AgeRangeConfig> {
        match self {
            AgePreset::Broad => bounded(&[(0, 14), (15, 64)], 65),
            AgePreset::FiveYear => stepped(5),
            AgePreset::TenYear => stepped(10),
            AgePreset::LifeStages => bounded(&[(0, 17), (18, 64), (65, 79)], 80),
        }
    }
}

fn bounded(closed: &[(i32, i32)], open_from: i32) -> Vec<AgeRangeConfig> {
    closed
        .iter()
        .map(|(from, to)| AgeRangeConfig::new(*from, Some(*to)))
        .chain(std::iter::once(AgeRangeConfig::new(open_from, None)))
        .collect()
}

fn stepped(width: i32) -> Vec<AgeRangeConfig> {
    let closed: Vec<(i32, i32)> = (0..100)
        .step_by(width as usize)
        .map(|from| (from, from + width - 1))
        .collect();
    bounded(&closed, 100)
}
