//! JSON document store — one document per instrument, keyed by
//! `instrument_key`.
//!
//! Layout: `{store_dir}/{key}.json` with the key sanitized for the
//! filesystem. An upsert replaces any existing document for the key; writes
//! are atomic (tmp + rename). Consumes the deduplicated Upstox table.

use scripdiff_core::CanonicalRecord;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::StoreError;

/// Outcome of one bulk upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocStoreSummary {
    pub written: usize,
    /// Records skipped because they carry no `instrument_key` to key on.
    pub skipped_missing_key: usize,
}

/// File-backed document store.
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Upsert every record, keyed by `instrument_key`.
    pub fn upsert_all(&self, records: &[CanonicalRecord]) -> Result<DocStoreSummary, StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::Io(format!("create dir: {e}")))?;

        let mut summary = DocStoreSummary::default();
        for rec in records {
            let Some(key) = rec.instrument_key.as_deref() else {
                summary.skipped_missing_key += 1;
                continue;
            };
            self.upsert(key, rec)?;
            summary.written += 1;
        }
        Ok(summary)
    }

    fn upsert(&self, key: &str, rec: &CanonicalRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(rec)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;

        let path = self.doc_path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::Io(e.to_string()))?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::Io(format!("atomic rename failed: {e}"))
        })?;
        Ok(())
    }

    /// Load the document for a key, if one exists.
    pub fn load(&self, key: &str) -> Option<CanonicalRecord> {
        let content = fs::read_to_string(self.doc_path(key)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Number of documents currently in the store.
    pub fn count(&self) -> usize {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };
        entries
            .flatten()
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("json"))
            .count()
    }

    fn doc_path(&self, key: &str) -> PathBuf {
        // Provider keys contain `|` and the like; keep filenames tame.
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}
