pub mod aggregate;
pub mod bins;
pub mod chart;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod io_utils;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod schema;
pub mod source;
pub mod summary;
pub mod table;
pub mod view;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, SourceArgs},
    config::PipelineConfig,
    filter::FieldFilter,
    pipeline::{InputOptions, LoadedCases},
    report::ReportOptions,
    schema::CanonicalField,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("case_tally", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Report(args) => handle_report(&args),
        Commands::Summary(args) => handle_summary(&args),
        Commands::Export(args) => handle_export(&args),
        Commands::Config(args) => handle_config(&args),
    }
}

fn handle_report(args: &cli::ReportArgs) -> Result<()> {
    let mut config = load_config(&args.source)?;
    if let Some(dir) = &args.tables_dir {
        config.output.tables_dir = dir.clone();
    }
    if let Some(dir) = &args.figures_dir {
        config.output.figures_dir = dir.clone();
    }
    if let Some(top) = args.top {
        config.top_n = top;
    }
    let filters = parse_filters(&args.source)?;
    let loaded = load(&config, &args.source)?;
    let view = view::recompute(&loaded.cases, &filters);
    let outcome = report::write_report(
        &view.records,
        &config,
        ReportOptions {
            figures: !args.no_figures,
        },
    )
    .context("Writing report")?;
    info!(
        "Report for {} record(s): {} table(s), {} figure(s), {} figure(s) skipped",
        view.kpis.total_records,
        outcome.tables.len(),
        outcome.figures.len(),
        outcome.skipped_figures.len()
    );
    Ok(())
}

fn handle_summary(args: &cli::SummaryArgs) -> Result<()> {
    let config = load_config(&args.source)?;
    let filters = parse_filters(&args.source)?;
    let choices_field = args
        .choices
        .as_deref()
        .map(|name| name.parse::<CanonicalField>())
        .transpose()?;
    let loaded = load(&config, &args.source)?;

    if let Some(field) = choices_field {
        let choices = filter::choices(&loaded.cases, field);
        print!("{}", summary::render_choices(field.as_str(), &choices));
        return Ok(());
    }

    let view = view::recompute(&loaded.cases, &filters);
    if args.json {
        println!("{}", summary::render_json(&view)?);
    } else {
        print!("{}", summary::render_overview(&view, &config));
    }
    Ok(())
}

fn handle_export(args: &cli::ExportArgs) -> Result<()> {
    let config = load_config(&args.source)?;
    let filters = parse_filters(&args.source)?;
    let loaded = load(&config, &args.source)?;
    let view = view::recompute(&loaded.cases, &filters);
    export::write_cases(&view.records, args.output.as_deref())
        .context("Exporting case records")?;
    Ok(())
}

fn handle_config(args: &cli::ConfigArgs) -> Result<()> {
    let config = PipelineConfig::default();
    match &args.output {
        Some(path) => {
            config.save(path)?;
            info!("Default configuration written to {path:?}");
        }
        None => print!("{}", config.to_yaml_string()?),
    }
    Ok(())
}

fn load_config(args: &SourceArgs) -> Result<PipelineConfig> {
    let config = PipelineConfig::load_or_default(args.config.as_deref())?;
    debug!("Configuration: {:?}", config);
    Ok(config)
}

fn parse_filters(args: &SourceArgs) -> Result<Vec<FieldFilter>> {
    filter::parse_filters(&args.filters).context("Parsing --filter expressions")
}

fn load(config: &PipelineConfig, args: &SourceArgs) -> Result<LoadedCases> {
    let options = InputOptions {
        input: args.input.clone(),
        delimiter: args.delimiter,
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
        use_cache: !args.no_cache,
    };
    let loaded = pipeline::load_cases(config, &options)?;
    info!(
        "Read '{}' with delimiter '{}' via {:?}",
        loaded.source.display(),
        printable_delimiter(io_utils::resolve_input_delimiter(
            &loaded.source,
            options.delimiter
        )),
        loaded.strategy
    );
    Ok(loaded)
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
