mod common;

use common::{expect_success, fixture_path, summarize};
use pop_pyramid::{
    aggregate::{
        AgeGroupError, AgeRangeConfig, aggregate_by_age_groups, validate_age_groups,
    },
    config::{AgePreset, load_age_ranges},
    data::{PopulationAgeGroup, PopulationData},
    pipeline::parse_population_file,
};

fn single_years(max: u32) -> PopulationData {
    PopulationData::new(
        "pop",
        (0..=max)
            .map(|age| PopulationAgeGroup::new(age.to_string(), age, 10.0, 20.0))
            .collect(),
    )
}

fn ranges(bounds: &[(i32, Option<i32>)]) -> Vec<AgeRangeConfig> {
    bounds
        .iter()
        .map(|(from, to)| AgeRangeConfig::new(*from, *to))
        .collect()
}

#[test]
fn overlapping_and_contiguous_ranges() {
    let overlapping = validate_age_groups(&ranges(&[(0, Some(19)), (15, Some(64))]), 100);
    assert!(!overlapping.valid);
    assert!(
        overlapping
            .errors
            .iter()
            .any(|e| matches!(e, AgeGroupError::Overlap { .. }))
    );

    let contiguous = validate_age_groups(&ranges(&[(0, Some(19)), (20, Some(64)), (65, None)]), 100);
    assert!(contiguous.valid);
}

#[test]
fn reaggregating_with_new_ranges_does_not_accumulate() {
    let data = single_years(99);
    let broad = ranges(&[(0, Some(49)), (50, None)]);
    let narrow = ranges(&[(0, Some(9)), (10, Some(19))]);

    let first = aggregate_by_age_groups(&data, &broad);
    let again = aggregate_by_age_groups(&data, &broad);
    assert_eq!(first, again);

    let second = aggregate_by_age_groups(&data, &narrow);
    assert_eq!(
        summarize(&second.age_groups),
        vec![
            ("0-9".to_string(), 100.0, 200.0),
            ("10-19".to_string(), 100.0, 200.0),
        ]
    );
}

#[test]
fn groups_file_drives_aggregation_of_parsed_data() {
    let parsed = expect_success(parse_population_file(&fixture_path("simple_total.csv")));
    let ranges = load_age_ranges(&fixture_path("groups.yml")).expect("groups file");
    assert!(validate_age_groups(&ranges, 85).valid);
    let grouped = aggregate_by_age_groups(&parsed.data, &ranges);
    assert_eq!(
        summarize(&grouped.age_groups),
        vec![
            ("0-14".to_string(), 2251.0, 2250.0),
            ("15-64".to_string(), 0.0, 0.0),
            ("65+".to_string(), 151.0, 150.0),
        ]
    );
    assert_eq!(grouped.title, "simple_total (grouped)");
    assert_eq!(grouped.has_gender_data, Some(false));
}

#[test]
fn overlapping_groups_file_fails_validation() {
    let ranges = load_age_ranges(&fixture_path("overlapping_groups.yml")).expect("groups file");
    let validation = validate_age_groups(&ranges, 100);
    assert!(!validation.valid);
    assert_eq!(validation.errors.len(), 1);
}

#[test]
fn missing_groups_file_reports_path() {
    let err = load_age_ranges(&fixture_path("nope.yml")).unwrap_err();
    assert!(err.to_string().contains("nope.yml"));
}

#[test]
fn broad_preset_covers_every_single_year() {
    let data = single_years(100);
    let grouped = aggregate_by_age_groups(&data, &AgePreset::Broad.ranges());
    let grouped_total: f64 = grouped.age_groups.iter().map(|g| g.total()).sum();
    let source_total: f64 = data.age_groups.iter().map(|g| g.total()).sum();
    assert_eq!(grouped_total, source_total);
}
