use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::AgePreset;

#[derive(Debug, Parser)]
#[command(author, version, about = "Load population pyramid data from CSV, Excel and Eurostat files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Report the detected data format of a file
    Detect(DetectArgs),
    /// Parse a file into age groups and print them as a table or JSON
    Parse(ParseArgs),
    /// Print totals, median age and a chart axis scale
    Stats(StatsArgs),
    /// Regroup ages into custom ranges
    Aggregate(AggregateArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Population file (.csv, .tsv, .txt, .xlsx, .xls, .xlsm, .xlsb, .ods)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|'); sniffed when omitted
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of delimited input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct DetectArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Args)]
pub struct ParseArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Year to show for time-series files (defaults to the latest)
    #[arg(long)]
    pub year: Option<i32>,
    /// Emit the full parse result as JSON
    #[arg(long)]
    pub json: bool,
    /// Show counts as percentages of the grand total
    #[arg(long)]
    pub percent: bool,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Year to summarise for time-series files (defaults to the latest)
    #[arg(long)]
    pub year: Option<i32>,
    /// Use the finer axis staircase with 10% headroom
    #[arg(long)]
    pub tight: bool,
}

#[derive(Debug, Args)]
pub struct AggregateArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// YAML file listing age groups (`groups: [{from: 0, to: 14}, {from: 65}]`)
    #[arg(long, conflicts_with_all = ["preset", "ranges"])]
    pub groups: Option<PathBuf>,
    /// Built-in set of age groups
    #[arg(long, value_enum, conflicts_with = "ranges")]
    pub preset: Option<AgePreset>,
    /// Age range such as `0-14`, `65+` or `5` (repeatable)
    #[arg(long = "range", action = clap::ArgAction::Append)]
    pub ranges: Vec<String>,
    /// Upper age assumed for open-ended ranges during validation (defaults to the data's maximum)
    #[arg(long)]
    pub max_age: Option<i32>,
    /// Year to aggregate for time-series files (defaults to the latest)
    #[arg(long)]
    pub year: Option<i32>,
    /// Emit the aggregated dataset as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
