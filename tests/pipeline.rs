mod common;

use common::{TestWorkspace, expect_success, fixture_path, summarize};
use pop_pyramid::{
    data::PopulationAgeGroup,
    error::ErrorCode,
    eurostat::EUROSTAT_SOURCE,
    format::DataFormat,
    pipeline::{
        Completion, IngestOptions, IngestSession, ParseResult, parse_population_file,
        parse_population_file_with,
    },
    progress::{NoProgress, ProgressUpdate, Stage},
    stats,
};

#[test]
fn simple_csv_end_to_end() {
    let parsed = expect_success(parse_population_file(&fixture_path("simple.csv")));
    assert_eq!(parsed.detected_format, DataFormat::Simple);
    assert!(parsed.time_series_data.is_none());
    assert_eq!(parsed.data.title, "simple");
    assert_eq!(
        &parsed.data.age_groups[..2],
        &[
            PopulationAgeGroup::new("0", 0, 893000.0, 847000.0),
            PopulationAgeGroup::new("1", 1, 889000.0, 845000.0),
        ]
    );
    assert!(parsed.data.has_gender_split());
}

#[test]
fn two_row_scenario_totals_and_median() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("pyramid.csv", "age,male,female\n0,893000,847000\n1,889000,845000\n");
    let parsed = expect_success(parse_population_file(&path));
    let totals = stats::totals(&parsed.data.age_groups);
    assert_eq!(totals.total, 3_474_000.0);
    // Age 0 alone holds 1_740_000, already past half of 3_474_000.
    assert_eq!(stats::median_age(&parsed.data.age_groups), 0);
}

#[test]
fn simple_rows_are_sorted_without_duplicates() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("shuffled.csv", "age,male,female\n10,1,1\n0,2,2\n5,3,3\n");
    let parsed = expect_success(parse_population_file(&path));
    let ages: Vec<u32> = parsed.data.age_groups.iter().map(|g| g.age_numeric).collect();
    assert_eq!(ages, vec![0, 5, 10]);
}

#[test]
fn total_only_rows_split_exactly() {
    let parsed = expect_success(parse_population_file(&fixture_path("simple_total.csv")));
    assert_eq!(parsed.detected_format, DataFormat::SimpleTotal);
    assert_eq!(parsed.data.has_gender_data, Some(false));
    assert_eq!(
        summarize(&parsed.data.age_groups),
        vec![
            ("0-4".to_string(), 501.0, 500.0),
            ("5-9".to_string(), 1000.0, 1000.0),
            ("10-14".to_string(), 750.0, 750.0),
            ("85+".to_string(), 151.0, 150.0),
        ]
    );
    let ages: Vec<u32> = parsed.data.age_groups.iter().map(|g| g.age_numeric).collect();
    assert_eq!(ages, vec![0, 5, 10, 85]);
}

#[test]
fn timeseries_buckets_by_year_and_exposes_latest() {
    let parsed = expect_success(parse_population_file(&fixture_path("timeseries.csv")));
    assert_eq!(parsed.detected_format, DataFormat::Timeseries);
    let series = parsed.time_series_data.expect("time series");
    assert_eq!(series.years, vec![2020, 2021]);
    assert_eq!(
        summarize(&series.data_by_year[&2021]),
        vec![("0".to_string(), 105.0, 92.0), ("1".to_string(), 120.0, 100.0)]
    );
    assert_eq!(parsed.data.date.as_deref(), Some("2021"));
    assert_eq!(parsed.data.age_groups, series.data_by_year[&2021]);
}

#[test]
fn timeseries_total_splits_each_year() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("years.csv", "year,age,total\n2019,0,11\n2020,0,4\n");
    let parsed = expect_success(parse_population_file(&path));
    assert_eq!(parsed.detected_format, DataFormat::TimeseriesTotal);
    let series = parsed.time_series_data.expect("time series");
    assert_eq!(series.has_gender_data, Some(false));
    assert_eq!(summarize(&series.data_by_year[&2019]), vec![("0".to_string(), 6.0, 5.0)]);
    assert_eq!(summarize(&series.data_by_year[&2020]), vec![("0".to_string(), 2.0, 2.0)]);
}

#[test]
fn eurostat_export_sums_by_year_and_skips_aggregates() {
    let parsed = expect_success(parse_population_file(&fixture_path("eurostat.csv")));
    assert_eq!(parsed.detected_format, DataFormat::Eurostat);
    let series = parsed.time_series_data.expect("time series");
    assert_eq!(series.geo_code.as_deref(), Some("FR"));
    assert_eq!(series.source.as_deref(), Some(EUROSTAT_SOURCE));
    assert_eq!(series.years, vec![2020, 2021]);
    assert_eq!(
        series.data_by_year[&2020],
        vec![PopulationAgeGroup::new("0", 0, 367500.0, 351200.0)]
    );
    assert_eq!(
        summarize(&series.data_by_year[&2021]),
        vec![
            ("0".to_string(), 360000.0, 350000.0),
            ("100+".to_string(), 4000.0, 21000.0),
        ]
    );
    let total = stats::totals(&parsed.data.age_groups).total;
    assert_eq!(total, 735_000.0);
}

#[test]
fn semicolon_export_with_decimal_commas() {
    let parsed = expect_success(parse_population_file(&fixture_path("semicolon_decimal.csv")));
    assert_eq!(
        summarize(&parsed.data.age_groups),
        vec![("0".to_string(), 1234.5, 1100.0), ("1".to_string(), 2.5, 0.0)]
    );
}

#[test]
fn bom_prefixed_header_is_recognised() {
    let parsed = expect_success(parse_population_file(&fixture_path("bom.csv")));
    assert_eq!(parsed.detected_format, DataFormat::Simple);
    assert_eq!(parsed.data.age_groups[0].male, 10.0);
}

#[test]
fn unparseable_cells_fall_back_to_zero() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "messy.csv",
        "age,male,female\nunder one,n/a,-12\n3,,7\n",
    );
    let parsed = expect_success(parse_population_file(&path));
    assert_eq!(
        summarize(&parsed.data.age_groups),
        vec![("under one".to_string(), 0.0, 12.0), ("3".to_string(), 0.0, 7.0)]
    );
    assert_eq!(parsed.data.age_groups[0].age_numeric, 0);
}

#[test]
fn missing_required_columns_are_fatal() {
    let result = parse_population_file(&fixture_path("no_age.csv"));
    assert_eq!(result, ParseResult::Failure { error: ErrorCode::AgeColumnNotFound });

    let workspace = TestWorkspace::new();
    let path = workspace.write("half.csv", "age,male\n0,1\n");
    assert_eq!(
        parse_population_file(&path).error(),
        Some(ErrorCode::FemaleColumnNotFound)
    );
}

#[test]
fn header_only_file_still_validates_columns() {
    let workspace = TestWorkspace::new();
    let ok = workspace.write("empty.csv", "age,male,female\n");
    let parsed = expect_success(parse_population_file(&ok));
    assert!(parsed.data.age_groups.is_empty());

    let bad = workspace.write("empty_bad.csv", "age,total_count\n");
    assert_eq!(
        parse_population_file(&bad).error(),
        Some(ErrorCode::MaleColumnNotFound)
    );
}

#[test]
fn unsupported_extension_reports_unknown_format() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("population.json", "{}");
    assert_eq!(
        parse_population_file(&path).error(),
        Some(ErrorCode::UnknownFileFormat)
    );
}

#[test]
fn xlsx_workbook_parses_first_sheet() {
    let parsed = expect_success(parse_population_file(&fixture_path("simple.xlsx")));
    assert_eq!(parsed.detected_format, DataFormat::Simple);
    assert_eq!(
        summarize(&parsed.data.age_groups),
        vec![
            ("0".to_string(), 300.0, 290.0),
            ("5".to_string(), 400.0, 390.0),
            ("10".to_string(), 500.0, 480.0),
        ]
    );
}

#[test]
fn xlsx_total_only_workbook_is_split() {
    let parsed = expect_success(parse_population_file(&fixture_path("simple_total.xlsx")));
    assert_eq!(parsed.detected_format, DataFormat::SimpleTotal);
    assert_eq!(
        summarize(&parsed.data.age_groups),
        vec![("0-4".to_string(), 6.0, 5.0), ("5-9".to_string(), 10.0, 10.0)]
    );
}

#[test]
fn corrupt_workbook_is_an_excel_error() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("broken.xlsx", "not a zip archive");
    assert_eq!(
        parse_population_file(&path).error(),
        Some(ErrorCode::ExcelParseError)
    );
}

#[test]
fn progress_reports_every_stage_in_order() {
    let mut updates: Vec<ProgressUpdate> = Vec::new();
    let mut sink = |u: &ProgressUpdate| updates.push(u.clone());
    let result = parse_population_file_with(
        &fixture_path("simple.csv"),
        &IngestOptions::default(),
        &mut sink,
    );
    assert!(result.is_success());
    let stages: Vec<(Stage, u8, &str)> = updates
        .iter()
        .map(|u| (u.stage, u.percent, u.message_key.as_str()))
        .collect();
    assert_eq!(
        stages,
        vec![
            (Stage::Reading, 20, "progress.reading"),
            (Stage::Detecting, 40, "progress.detecting"),
            (Stage::Validating, 60, "progress.validating"),
            (Stage::Building, 80, "progress.building"),
            (Stage::Done, 100, "progress.done"),
        ]
    );
}

#[test]
fn progress_failure_carries_error_key() {
    let mut updates: Vec<ProgressUpdate> = Vec::new();
    let mut sink = |u: &ProgressUpdate| updates.push(u.clone());
    parse_population_file_with(
        &fixture_path("no_age.csv"),
        &IngestOptions::default(),
        &mut sink,
    );
    let last = updates.last().expect("updates");
    assert_eq!(last.stage, Stage::Error);
    assert_eq!(last.message_key, "error.AGE_COLUMN_NOT_FOUND");
    assert_eq!(last.percent, 60);
    assert!(updates.iter().all(|u| u.stage != Stage::Done));
}

#[test]
fn explicit_delimiter_overrides_sniffing() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("piped.txt", "age|male|female\n0|4|5\n");
    let options = IngestOptions {
        delimiter: Some(b'|'),
        ..IngestOptions::default()
    };
    let parsed = expect_success(parse_population_file_with(&path, &options, &mut NoProgress));
    assert_eq!(summarize(&parsed.data.age_groups), vec![("0".to_string(), 4.0, 5.0)]);
}

#[test]
fn latin1_input_decodes_with_selected_encoding() {
    let workspace = TestWorkspace::new();
    // 0xE9 is "é" in Windows-1252 and invalid as UTF-8.
    let mut bytes = b"age,male,female\n".to_vec();
    bytes.extend_from_slice(b"0 an\xe9e,1,2\n");
    let path = workspace.write_bytes("latin1.csv", &bytes);

    assert_eq!(
        parse_population_file(&path).error(),
        Some(ErrorCode::CsvParseError)
    );

    let options = IngestOptions {
        encoding: encoding_rs::WINDOWS_1252,
        ..IngestOptions::default()
    };
    let parsed = expect_success(parse_population_file_with(&path, &options, &mut NoProgress));
    assert_eq!(parsed.data.age_groups[0].age, "0 année");
}

#[test]
fn session_keeps_only_latest_ingestion() {
    let mut session = IngestSession::new();
    let stale = session.begin();
    let outcome = session.load(
        &fixture_path("simple.csv"),
        &IngestOptions::default(),
        &mut NoProgress,
    );
    assert_eq!(outcome, Completion::Applied);
    let late = parse_population_file(&fixture_path("timeseries.csv"));
    assert!(matches!(session.complete(stale, late), Completion::Superseded(_)));
    assert_eq!(session.current().expect("current").data.title, "simple");

    session.load(&fixture_path("no_age.csv"), &IngestOptions::default(), &mut NoProgress);
    assert!(session.current().is_none());
    assert_eq!(session.last_error(), Some(ErrorCode::AgeColumnNotFound));
}
