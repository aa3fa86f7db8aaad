//! Source loading with a fingerprinted snapshot cache.
//!
//! Parsing the CSV is the baseline strategy and always works. When a snapshot
//! path is configured the loader first tries the preferred strategy: a bincode
//! snapshot of a previous parse, accepted only if its [`SourceFingerprint`]
//! matches the current source bytes. The choice is made once per load and
//! logged; a stale, unreadable, or unwritable snapshot never fails the run.

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use encoding_rs::Encoding;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{error::PipelineError, io_utils};

const SNAPSHOT_VERSION: u32 = 1;

/// Header plus untyped rows, exactly as read from the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reads a delimited file (or stdin for `-`) into a [`RawTable`].
///
/// A missing file is reported as [`PipelineError::MissingSource`] before any
/// parsing starts. A zero-byte file yields an empty table.
pub fn read_csv(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<RawTable> {
    ensure_source_exists(path)?;
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)
        .with_context(|| format!("Reading headers from {path:?}"))?;
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = io_utils::decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        rows.push(decoded);
    }
    debug!("Parsed {} row(s) from {:?}", rows.len(), path);
    Ok(RawTable { headers, rows })
}

fn ensure_source_exists(path: &Path) -> Result<()> {
    if !io_utils::is_dash(path) && !path.is_file() {
        return Err(PipelineError::MissingSource {
            path: path.to_path_buf(),
        }
        .into());
    }
    Ok(())
}

/// Identity of a parsed source: its bytes plus the parse settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFingerprint {
    pub len: u64,
    pub sha256: String,
    pub delimiter: u8,
    pub encoding: String,
}

impl SourceFingerprint {
    pub fn compute(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening {path:?} for hashing"))?;
        let mut reader = BufReader::new(file);
        let mut hasher = Sha256::new();
        let len = io::copy(&mut reader, &mut hasher)
            .with_context(|| format!("Hashing {path:?}"))?;
        Ok(Self {
            len,
            sha256: format!("{:x}", hasher.finalize()),
            delimiter,
            encoding: encoding.name().to_string(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    fingerprint: SourceFingerprint,
    cached_at_millis: i64,
    table: RawTable,
}

impl Snapshot {
    fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("Opening snapshot {path:?}"))?;
        let (snapshot, _): (Snapshot, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
                .with_context(|| format!("Decoding snapshot {path:?}"))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PipelineError::SnapshotVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            }
            .into());
        }
        Ok(snapshot)
    }

    fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            io_utils::ensure_dir(parent)?;
        }
        let file =
            File::create(path).with_context(|| format!("Creating snapshot {path:?}"))?;
        let mut writer = BufWriter::new(file);
        bincode::serde::encode_into_std_write(self, &mut writer, bincode::config::standard())
            .context("Writing snapshot")?;
        Ok(())
    }

    fn cached_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.cached_at_millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    Snapshot,
    Csv,
}

#[derive(Debug)]
pub struct LoadedSource {
    pub table: RawTable,
    pub strategy: LoadStrategy,
}

#[derive(Debug, Clone)]
pub struct SourceLoader {
    pub path: PathBuf,
    pub delimiter: u8,
    pub encoding: &'static Encoding,
    pub snapshot: Option<PathBuf>,
}

impl SourceLoader {
    pub fn new(path: impl Into<PathBuf>, delimiter: u8, encoding: &'static Encoding) -> Self {
        Self {
            path: path.into(),
            delimiter,
            encoding,
            snapshot: None,
        }
    }

    pub fn with_snapshot(mut self, snapshot: Option<PathBuf>) -> Self {
        self.snapshot = snapshot;
        self
    }

    pub fn load(&self) -> Result<LoadedSource> {
        ensure_source_exists(&self.path)?;
        let snapshot_path = match &self.snapshot {
            Some(path) if !io_utils::is_dash(&self.path) => path,
            _ => {
                info!("Loading {:?} by parsing CSV (snapshot cache disabled)", self.path);
                return self.parse();
            }
        };

        let fingerprint = SourceFingerprint::compute(&self.path, self.delimiter, self.encoding)?;
        match self.try_snapshot(snapshot_path, &fingerprint) {
            Some(table) => {
                info!(
                    "Loaded {} row(s) from snapshot {:?}",
                    table.len(),
                    snapshot_path
                );
                Ok(LoadedSource {
                    table,
                    strategy: LoadStrategy::Snapshot,
                })
            }
            None => {
                info!(
                    "Snapshot {:?} unavailable for current source; parsing CSV {:?}",
                    snapshot_path, self.path
                );
                let loaded = self.parse()?;
                let snapshot = Snapshot {
                    version: SNAPSHOT_VERSION,
                    fingerprint,
                    cached_at_millis: Utc::now().timestamp_millis(),
                    table: loaded.table,
                };
                if let Err(err) = snapshot.save(snapshot_path) {
                    warn!("Could not write snapshot {snapshot_path:?}: {err:#}");
                } else {
                    debug!("Wrote snapshot {snapshot_path:?}");
                }
                Ok(LoadedSource {
                    table: snapshot.table,
                    strategy: LoadStrategy::Csv,
                })
            }
        }
    }

    fn parse(&self) -> Result<LoadedSource> {
        let table = read_csv(&self.path, self.delimiter, self.encoding)?;
        Ok(LoadedSource {
            table,
            strategy: LoadStrategy::Csv,
        })
    }

    fn try_snapshot(&self, path: &Path, fingerprint: &SourceFingerprint) -> Option<RawTable> {
        if !path.is_file() {
            debug!("No snapshot at {path:?}");
            return None;
        }
        let snapshot = match Snapshot::load(path) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("Ignoring unreadable snapshot {path:?}: {err:#}");
                return None;
            }
        };
        if snapshot.fingerprint != *fingerprint {
            debug!(
                "Snapshot {path:?} was taken from different source content (cached at {})",
                snapshot
                    .cached_at()
                    .map(|ts| ts.to_rfc3339())
                    .unwrap_or_else(|| "unknown time".into())
            );
            return None;
        }
        Some(snapshot.table)
    }
}
