//! Typed failures that callers may want to match on.
//!
//! Everything else flows through `anyhow` with context attached at the IO
//! boundary. These variants are the ones a caller can act on: a missing source
//! file, a filter naming a field the pipeline does not know, a malformed bin
//! table, or a snapshot written by an incompatible build.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Source CSV not found at {path:?}")]
    MissingSource { path: PathBuf },
    #[error("Unknown canonical field '{0}' (expected one of: {fields})", fields = crate::schema::CanonicalField::names().join(", "))]
    UnknownField(String),
    #[error("Invalid age bins: {0}")]
    InvalidBins(String),
    #[error("Snapshot format version {found} is not supported (expected {expected})")]
    SnapshotVersion { found: u32, expected: u32 },
}
