//! Pipeline configuration.
//!
//! A [`PipelineConfig`] value is built once (defaults, optionally overlaid by a
//! YAML file, then by CLI flags) and passed into every entry point. Nothing in
//! the crate reads configuration from global state.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{bins::AgeBins, schema::ColumnMapping};

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Bundled source CSV.
    pub source: PathBuf,
    /// Canonical field → source column header.
    pub columns: ColumnMapping,
    pub output: OutputConfig,
    /// Snapshot cache for `source`; `None` disables caching.
    pub snapshot: Option<PathBuf>,
    pub age_bins: AgeBins,
    /// Rows kept in the top-N reports (provinces, nationalities).
    pub top_n: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub tables_dir: PathBuf,
    pub figures_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            tables_dir: PathBuf::from("out").join("tables"),
            figures_dir: PathBuf::from("out").join("figures"),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("data").join("patients.csv"),
            columns: ColumnMapping::default(),
            output: OutputConfig::default(),
            snapshot: Some(PathBuf::from("out").join("cache").join("patients.snapshot")),
            age_bins: AgeBins::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Opening config file {path:?}"))?;
        let config: PipelineConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("Parsing config file {path:?}"))?;
        config.validate()?;
        Ok(config)
    }

    /// The file at `path` when given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.age_bins
            .validate()
            .context("Validating age_bins configuration")?;
        Ok(())
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing configuration")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml_string()?;
        fs::write(path, yaml).with_context(|| format!("Writing config file {path:?}"))
    }
}
