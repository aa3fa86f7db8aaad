use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::info;

use crate::{
    config::PipelineConfig,
    io_utils,
    normalize::normalize,
    record::CaseTable,
    schema::map_columns,
    source::{LoadStrategy, RawTable, SourceLoader},
};

/// Mapping followed by normalization.
pub fn standardize(raw: &RawTable, config: &PipelineConfig) -> CaseTable {
    let mapped = map_columns(raw, &config.columns);
    normalize(&mapped, &config.age_bins)
}

/// Where and how to read one run's input.
#[derive(Debug, Clone)]
pub struct InputOptions {
    /// Overrides `config.source` (an uploaded or ad hoc file, or `-`).
    pub input: Option<PathBuf>,
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    pub use_cache: bool,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            input: None,
            delimiter: None,
            encoding: encoding_rs::UTF_8,
            use_cache: true,
        }
    }
}

#[derive(Debug)]
pub struct LoadedCases {
    pub source: PathBuf,
    pub strategy: LoadStrategy,
    pub cases: CaseTable,
}

/// Reads the source selected by `options` and standardizes it.
///
/// The snapshot cache only ever applies to the configured source file; any
/// other input is parsed directly.
pub fn load_cases(config: &PipelineConfig, options: &InputOptions) -> Result<LoadedCases> {
    let source = options
        .input
        .clone()
        .unwrap_or_else(|| config.source.clone());
    let delimiter = io_utils::resolve_input_delimiter(&source, options.delimiter);
    let snapshot = if options.use_cache && is_configured_source(&source, &config.source) {
        config.snapshot.clone()
    } else {
        None
    };
    let loaded = SourceLoader::new(&source, delimiter, options.encoding)
        .with_snapshot(snapshot)
        .load()
        .with_context(|| format!("Loading case records from {source:?}"))?;
    let cases = standardize(&loaded.table, config);
    info!(
        "Standardized {} record(s) with field(s): {}",
        cases.len(),
        cases
            .fields()
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(LoadedCases {
        source,
        strategy: loaded.strategy,
        cases,
    })
}

fn is_configured_source(input: &Path, configured: &Path) -> bool {
    !io_utils::is_dash(input) && input == configured
}
