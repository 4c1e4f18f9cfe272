pub mod aggregate;
pub mod cli;
pub mod columns;
pub mod config;
pub mod data;
pub mod error;
pub mod eurostat;
pub mod format;
pub mod io_utils;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod rows;
pub mod spreadsheet;
pub mod stats;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use itertools::Itertools;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{AggregateArgs, Cli, Commands, DetectArgs, InputArgs, ParseArgs, StatsArgs},
    data::PopulationData,
    pipeline::{IngestOptions, ParseResult, ParsedPopulation},
    progress::ProgressUpdate,
    table::{AGE_GROUP_ALIGNS, Align},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("pop_pyramid", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Detect(args) => handle_detect(&args),
        Commands::Parse(args) => handle_parse(&args),
        Commands::Stats(args) => handle_stats(&args),
        Commands::Aggregate(args) => handle_aggregate(&args),
    }
}

fn ingest_options(input: &InputArgs) -> Result<IngestOptions> {
    let encoding = io_utils::resolve_encoding(input.input_encoding.as_deref())?;
    if let Some(delimiter) = input.delimiter {
        debug!("Using delimiter '{}'", printable_delimiter(delimiter));
    }
    Ok(IngestOptions {
        delimiter: input.delimiter,
        encoding,
    })
}

fn ingest(input: &InputArgs) -> Result<ParseResult> {
    let options = ingest_options(input)?;
    let mut log_progress = |update: &ProgressUpdate| {
        debug!("{} ({}%)", update.message_key, update.percent);
    };
    Ok(pipeline::parse_population_file_with(
        &input.input,
        &options,
        &mut log_progress,
    ))
}

fn require_success(result: ParseResult, input: &InputArgs) -> Result<ParsedPopulation> {
    match result {
        ParseResult::Success(parsed) => Ok(parsed),
        ParseResult::Failure { error } => bail!("Parsing {:?} failed: {error}", input.input),
    }
}

/// Picks the dataset to work on: the requested year of a time series, or
/// the parsed snapshot (latest year) when no year is given.
fn select_year(parsed: &ParsedPopulation, year: Option<i32>) -> Result<PopulationData> {
    let Some(year) = year else {
        return Ok(parsed.data.clone());
    };
    let series = parsed
        .time_series_data
        .as_ref()
        .ok_or_else(|| anyhow!("--year requires a time-series file, got {}", parsed.detected_format))?;
    series.snapshot(year).ok_or_else(|| {
        anyhow!(
            "Year {year} not present; available years: {}",
            series.years.iter().join(", ")
        )
    })
}

fn handle_detect(args: &DetectArgs) -> Result<()> {
    let options = ingest_options(&args.input)?;
    let format = pipeline::detect_format_with(&args.input.input, &options);
    info!("Detected '{}' as {}", args.input.input.display(), format);
    println!("{format}");
    Ok(())
}

fn handle_parse(args: &ParseArgs) -> Result<()> {
    let result = ingest(&args.input)?;
    if args.json && args.year.is_none() && !args.percent {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Serializing parse result")?
        );
        return match result.error() {
            Some(code) => Err(anyhow!("Parsing {:?} failed: {code}", args.input.input)),
            None => Ok(()),
        };
    }
    let parsed = require_success(result, &args.input)?;
    let data = select_year(&parsed, args.year)?;
    if args.json {
        let data = if args.percent { data.to_percentages() } else { data };
        println!(
            "{}",
            serde_json::to_string_pretty(&data).context("Serializing population data")?
        );
        return Ok(());
    }
    let (headers, rows) = table::age_group_table(&data, args.percent);
    table::print_table(&headers, &rows, &AGE_GROUP_ALIGNS);
    info!(
        "{} age group(s) from '{}' ({}{})",
        data.age_groups.len(),
        data.title,
        parsed.detected_format,
        data.date
            .as_deref()
            .map(|date| format!(", {date}"))
            .unwrap_or_default()
    );
    if !data.has_gender_split() {
        info!("Source has totals only; male/female counts are an even split");
    }
    Ok(())
}

fn handle_stats(args: &StatsArgs) -> Result<()> {
    let parsed = require_success(ingest(&args.input)?, &args.input)?;
    let data = select_year(&parsed, args.year)?;
    let totals = stats::totals(&data.age_groups);
    let axis_peak = match (&parsed.time_series_data, args.year) {
        (Some(series), None) => series.max_value(),
        _ => data.max_value(),
    };
    let mut rows = vec![
        vec!["title".to_string(), data.title.clone()],
        vec!["format".to_string(), parsed.detected_format.to_string()],
    ];
    if let Some(date) = &data.date {
        rows.push(vec!["year".to_string(), date.clone()]);
    }
    if let Some(series) = &parsed.time_series_data
        && let Some(geo) = &series.geo_code
    {
        rows.push(vec!["geo".to_string(), geo.clone()]);
    }
    rows.extend([
        vec!["age groups".to_string(), data.age_groups.len().to_string()],
        vec!["male".to_string(), table::format_count(totals.male)],
        vec!["female".to_string(), table::format_count(totals.female)],
        vec!["total".to_string(), table::format_count(totals.total)],
        vec![
            "median age".to_string(),
            stats::median_age(&data.age_groups).to_string(),
        ],
        vec!["max value".to_string(), table::format_count(axis_peak)],
        vec![
            "axis scale".to_string(),
            table::format_count(stats::nice_scale(axis_peak, args.tight)),
        ],
    ]);
    let headers = vec!["metric".to_string(), "value".to_string()];
    table::print_table(&headers, &rows, &[Align::Left, Align::Right]);
    Ok(())
}

fn age_ranges(args: &AggregateArgs) -> Result<Vec<aggregate::AgeRangeConfig>> {
    if let Some(path) = &args.groups {
        return config::load_age_ranges(path);
    }
    if let Some(preset) = args.preset {
        return Ok(preset.ranges());
    }
    if args.ranges.is_empty() {
        bail!("Provide age groups with --groups, --preset or --range");
    }
    aggregate::parse_ranges(&args.ranges)
}

fn handle_aggregate(args: &AggregateArgs) -> Result<()> {
    let ranges = age_ranges(args)?;
    let parsed = require_success(ingest(&args.input)?, &args.input)?;
    let data = select_year(&parsed, args.year)?;
    let max_age = match args.max_age {
        Some(max_age) => max_age,
        None => aggregate::max_age_of(&data)?,
    };
    aggregate::ensure_valid(&ranges, max_age)
        .with_context(|| format!("Validating {} age group(s)", ranges.len()))?;
    let grouped = aggregate::aggregate_by_age_groups(&data, &ranges);
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&grouped).context("Serializing aggregated data")?
        );
        return Ok(());
    }
    let (headers, rows) = table::age_group_table(&grouped, false);
    table::print_table(&headers, &rows, &AGE_GROUP_ALIGNS);
    let median = stats::median_age(&data.age_groups);
    if let Some(idx) = stats::median_age_index(&grouped.age_groups, median) {
        info!(
            "Median age {} falls in group {}",
            median, grouped.age_groups[idx].age
        );
    }
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
