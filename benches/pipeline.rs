use std::fs::File;
use std::hint::black_box;
use std::io::Write;
use std::path::PathBuf;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use pop_pyramid::aggregate::aggregate_by_age_groups;
use pop_pyramid::config::AgePreset;
use pop_pyramid::pipeline::{ParseResult, parse_population_file};
use tempfile::TempDir;

fn generate_timeseries(years: i32) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("timeseries.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    writeln!(file, "year,age,male,female").expect("header");
    for year in 2000..2000 + years {
        for age in 0..=100 {
            let male = 900_000 - age * 7_000 + year;
            let female = 880_000 - age * 6_500 + year;
            writeln!(file, "{year},{age},{male},{female}").expect("row");
        }
    }
    (temp_dir, csv_path)
}

fn generate_eurostat(years: i32) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("demo_pjan.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    writeln!(file, "DATAFLOW,freq,unit,sex,age,geo,TIME_PERIOD,OBS_VALUE").expect("header");
    for year in 2000..2000 + years {
        for sex in ["M", "F", "T"] {
            writeln!(file, "ESTAT:DEMO_PJAN(1.0),A,NR,{sex},Y_LT1,DE,{year},380000").expect("row");
            for age in 1..100 {
                writeln!(file, "ESTAT:DEMO_PJAN(1.0),A,NR,{sex},Y{age},DE,{year},{}", 400_000 - age * 3_000)
                    .expect("row");
            }
            writeln!(file, "ESTAT:DEMO_PJAN(1.0),A,NR,{sex},Y_GE100,DE,{year},21000").expect("row");
            writeln!(file, "ESTAT:DEMO_PJAN(1.0),A,NR,{sex},TOTAL,DE,{year},83000000").expect("row");
        }
    }
    (temp_dir, csv_path)
}

fn bench_pipeline(c: &mut Criterion) {
    let (series_dir, series_path) = generate_timeseries(30);
    let (eurostat_dir, eurostat_path) = generate_eurostat(30);
    let mut group = c.benchmark_group("ingest");

    group.bench_function("timeseries_csv", |b| {
        b.iter(|| {
            let result = parse_population_file(black_box(&series_path));
            assert!(result.is_success());
        });
    });

    group.bench_function("eurostat_csv", |b| {
        b.iter(|| {
            let result = parse_population_file(black_box(&eurostat_path));
            assert!(result.is_success());
        });
    });

    let ParseResult::Success(parsed) = parse_population_file(&series_path) else {
        panic!("benchmark input failed to parse");
    };
    let ranges = AgePreset::FiveYear.ranges();
    group.bench_function("aggregate_five_year", |b| {
        b.iter_batched(
            || parsed.data.clone(),
            |data| aggregate_by_age_groups(&data, &ranges),
            BatchSize::SmallInput,
        );
    });

    group.finish();
    drop(series_dir);
    drop(eurostat_dir);
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
