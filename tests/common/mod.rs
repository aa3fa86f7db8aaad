#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use case_tally::config::{OutputConfig, PipelineConfig};
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Copies a `tests/data` fixture into the workspace.
    pub fn copy_fixture(&self, name: &str) -> PathBuf {
        let target = self.temp_dir.path().join(name);
        fs::copy(fixture_path(name), &target).expect("copy fixture");
        target
    }

    /// Configuration whose source, snapshot and output directories all live
    /// inside the workspace.
    pub fn config_for(&self, source: &Path) -> PipelineConfig {
        let root = self.temp_dir.path();
        PipelineConfig {
            source: source.to_path_buf(),
            output: OutputConfig {
                tables_dir: root.join("out").join("tables"),
                figures_dir: root.join("out").join("figures"),
            },
            snapshot: Some(root.join("out").join("cache").join("patients.snapshot")),
            ..PipelineConfig::default()
        }
    }

    /// Saves [`TestWorkspace::config_for`] as YAML and returns its path.
    pub fn write_config(&self, source: &Path) -> PathBuf {
        let path = self.temp_dir.path().join("case-tally.yml");
        self.config_for(source).save(&path).expect("write config");
        path
    }
}
