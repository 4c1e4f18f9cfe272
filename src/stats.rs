//! Pure statistics over canonical age groups.
//!
//! None of these functions mutate their input; calling them repeatedly on the
//! same slice always returns the same answer.

use serde::{Deserialize, Serialize};

use crate::data::PopulationAgeGroup;

/// Axis bound used when there is nothing to scale.
pub const FALLBACK_SCALE: f64 = 100.0;
const STANDARD_STEPS: [f64; 4] = [1.0, 2.0, 5.0, 10.0];
const TIGHT_STEPS: [f64; 10] = [1.2, 1.5, 2.0, 2.5, 3.0, 4.0, 5.0, 6.0, 8.0, 10.0];
const TIGHT_HEADROOM: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationTotals {
    pub male: f64,
    pub female: f64,
    pub total: f64,
}

pub fn totals(groups: &[PopulationAgeGroup]) -> PopulationTotals {
    let (male, female) = groups
        .iter()
        .fold((0.0, 0.0), |(m, f), group| (m + group.male, f + group.female));
    PopulationTotals {
        male,
        female,
        total: male + female,
    }
}

/// Discrete median: the `age_numeric` of the first group at which the
/// cumulative population reaches half the grand total. No interpolation
/// happens inside a bucket. Empty input yields `0`.
pub fn median_age(groups: &[PopulationAgeGroup]) -> u32 {
    let half = totals(groups).total / 2.0;
    let mut cumulative = 0.0;
    for group in groups {
        cumulative += group.total();
        if cumulative >= half {
            return group.age_numeric;
        }
    }
    groups.last().map(|g| g.age_numeric).unwrap_or(0)
}

/// Locates the group a previously computed median belongs to.
///
/// `groups` is usually an aggregated axis while `median` came from the
/// ungrouped data. Lookup tries an exact `age_numeric` match, then interval
/// containment, then falls back to the last group.
pub fn median_age_index(groups: &[PopulationAgeGroup], median: u32) -> Option<usize> {
    if groups.is_empty() {
        return None;
    }
    if let Some(idx) = groups.iter().position(|g| g.age_numeric == median) {
        return Some(idx);
    }
    let contained = groups.iter().enumerate().position(|(idx, group)| {
        let upper = upper_bound(groups, idx);
        median >= group.age_numeric && upper.is_none_or(|upper| median <= upper)
    });
    Some(contained.unwrap_or(groups.len() - 1))
}

/// Inclusive upper bound of the group at `idx`: taken from a `"20-29"`
/// label when present, open for `"85+"`, otherwise just below the next
/// group's start.
fn upper_bound(groups: &[PopulationAgeGroup], idx: usize) -> Option<u32> {
    let group = &groups[idx];
    let label = group.age.trim();
    if label.ends_with('+') {
        return None;
    }
    if let Some((_, upper)) = label.split_once('-')
        && let Ok(upper) = upper.trim().parse::<u32>()
    {
        return Some(upper);
    }
    match groups.get(idx + 1) {
        Some(next) if next.age_numeric > group.age_numeric => Some(next.age_numeric - 1),
        Some(_) => Some(group.age_numeric),
        None => None,
    }
}

/// Rounds `value` up to a readable axis maximum.
///
/// Standard mode picks 1, 2, 5 or 10 times the order of magnitude. Tight mode
/// adds 10% headroom first and uses a finer staircase. Zero, negative and
/// non-finite inputs, and targets below the smallest representable power of
/// ten, yield [`FALLBACK_SCALE`]. Near `f64::MAX` the target comes back
/// unrounded, capped at `f64::MAX`.
pub fn nice_scale(value: f64, tight: bool) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return FALLBACK_SCALE;
    }
    let (target, steps): (f64, &[f64]) = if tight {
        (value * TIGHT_HEADROOM, &TIGHT_STEPS)
    } else {
        (value, &STANDARD_STEPS)
    };
    if !target.is_finite() {
        return f64::MAX;
    }
    let mut magnitude = 10f64.powi(target.log10().floor() as i32);
    // Subnormal targets underflow the power of ten.
    if magnitude == 0.0 || !magnitude.is_finite() {
        return FALLBACK_SCALE;
    }
    while target / magnitude > 10.0 {
        magnitude *= 10.0;
    }
    while target / magnitude < 1.0 {
        magnitude /= 10.0;
    }
    let normalized = target / magnitude;
    let step = steps
        .iter()
        .copied()
        .find(|step| *step >= normalized)
        .unwrap_or(10.0);
    let scaled = step * magnitude;
    // Guard against the product rounding just below the target or past f64::MAX.
    if !scaled.is_finite() || scaled < target {
        target
    } else {
        scaled
    }
}

pub fn to_percent(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        value / total * 100.0
    }
}
