//! Snapshot ingest — raw CSV bytes on disk → dataframe.
//!
//! Fetched snapshots are persisted before parsing so a run's inputs are
//! inspectable afterwards. Writes are atomic (tmp + rename).

use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("snapshot write failed: {0}")]
    Write(String),

    #[error("snapshot read failed: {0}")]
    Read(String),
}

/// Persist fetched snapshot bytes into the snapshot directory.
pub fn write_snapshot(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, IngestError> {
    fs::create_dir_all(dir).map_err(|e| IngestError::Write(format!("create dir: {e}")))?;

    let path = dir.join(file_name);
    let tmp = path.with_extension("csv.tmp");
    fs::write(&tmp, bytes).map_err(|e| IngestError::Write(e.to_string()))?;
    fs::rename(&tmp, &path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        IngestError::Write(format!("atomic rename failed: {e}"))
    })?;

    Ok(path)
}

/// Read a snapshot CSV with every column typed as a string.
///
/// Schema inference is disabled: provider files carry mixed-type columns,
/// and the projection layer owns all typing decisions.
pub fn read_snapshot(path: &Path) -> Result<DataFrame, IngestError> {
    LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()
        .and_then(LazyFrame::collect)
        .map_err(|e| IngestError::Read(format!("{}: {e}", path.display())))
}

/// Deterministic fingerprint of a raw snapshot, for the run report.
pub fn snapshot_fingerprint(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
