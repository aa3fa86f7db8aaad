use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Standardize and tally epidemiological case records",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write the aggregate tables (CSV) and charts (PNG) for the case source
    Report(ReportArgs),
    /// Print KPIs and quick breakdowns for the (optionally filtered) records
    Summary(SummaryArgs),
    /// Write the standardized, filtered records as CSV
    Export(ExportArgs),
    /// Write the default configuration as YAML
    Config(ConfigArgs),
}

/// Options shared by every command that reads case records.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Input CSV file (defaults to the configured source; `-` reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// YAML configuration file (built-in defaults when omitted)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Always parse the CSV, ignoring and not refreshing the snapshot cache
    #[arg(long = "no-cache")]
    pub no_cache: bool,
    /// Equality filters of the form `field=value`; `(All)` leaves a field unconstrained
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Directory for the aggregate CSV tables
    #[arg(long = "tables-dir")]
    pub tables_dir: Option<PathBuf>,
    /// Directory for the PNG charts
    #[arg(long = "figures-dir")]
    pub figures_dir: Option<PathBuf>,
    /// Rows kept in the top provinces and nationalities tables
    #[arg(long = "top")]
    pub top: Option<usize>,
    /// Skip chart rendering
    #[arg(long = "no-figures")]
    pub no_figures: bool,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Print the dashboard view as JSON instead of tables
    #[arg(long)]
    pub json: bool,
    /// Print the selectable filter values for a canonical field
    #[arg(long = "choices")]
    pub choices: Option<String>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Destination YAML file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
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
