//! Run orchestrator — fetch → ingest → project → dedupe → reconcile → sinks.
//!
//! The pipeline is a strict linear sequence; each stage's post-condition is
//! the next stage's precondition, and a violated precondition aborts the run.
//! All-or-nothing output: stores and artifacts are written only after the
//! partition validates, so a failed run leaves no output pretending to be
//! complete. (Raw snapshots are the exception — they are persisted on fetch
//! so a failed run's inputs can be inspected.)

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use scripdiff_core::{
    dedupe, project, reconcile, CanonicalRecord, DedupeReport, ProjectError, ProjectionReport,
    ReconcileError, ReconcileReport, ReconciledSets, SourceId, DHAN, UPSTOX,
};

use crate::config::PipelineConfig;
use crate::export::save_artifacts;
use crate::fetch::{FetchError, SnapshotSource};
use crate::ingest::{read_snapshot, snapshot_fingerprint, write_snapshot, IngestError};
use crate::store::{DocStoreSummary, DocumentStore, SqliteStore, StoreError};

/// Snapshot file names under the snapshot directory.
pub const UPSTOX_SNAPSHOT: &str = "upstox_nse.csv";
pub const DHAN_SNAPSHOT: &str = "dhan_scrip.csv";
/// Diagnostic report written next to the partition artifacts.
pub const REPORT_FILE: &str = "run_report.json";

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("ingest failed: {0}")]
    Ingest(#[from] IngestError),

    #[error("projection failed: {0}")]
    Project(#[from] ProjectError),

    #[error("reconcile failed: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("store failed: {0}")]
    Store(#[from] StoreError),

    #[error("artifact export failed: {0}")]
    Export(String),
}

/// Per-source slice of the run diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReport {
    pub source_id: SourceId,
    /// Where the snapshot came from (URL or local path).
    pub origin: String,
    /// blake3 of the raw snapshot bytes; identical inputs hash identically.
    pub snapshot_fingerprint: String,
    pub projection: ProjectionReport,
    pub dedupe: DedupeReport,
}

/// Aggregated diagnostics for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: NaiveDateTime,
    pub upstox: SourceReport,
    pub dhan: SourceReport,
    pub reconcile: ReconcileReport,
    pub doc_store: DocStoreSummary,
    pub sqlite_rows: usize,
}

impl RunReport {
    /// Every non-fatal data-quality observation, as human-readable lines.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for src in [&self.upstox, &self.dhan] {
            warnings.extend(src.projection.warnings.iter().cloned());
            for column in &src.projection.nulled_columns {
                warnings.push(format!(
                    "{}: column '{column}' absent from snapshot, projected as null",
                    src.source_id
                ));
            }
            if src.dedupe.null_key_drops > 0 {
                warnings.push(format!(
                    "{}: dropped {} rows with unusable trading symbols",
                    src.source_id, src.dedupe.null_key_drops
                ));
            }
            if src.dedupe.duplicate_drops > 0 {
                warnings.push(format!(
                    "{}: discarded {} duplicate rows for keys {:?}",
                    src.source_id, src.dedupe.duplicate_drops, src.dedupe.duplicate_keys
                ));
            }
        }
        warnings.extend(self.reconcile.fanout_repairs.iter().cloned());
        warnings
    }
}

/// Everything a successful run produces.
#[derive(Debug)]
pub struct RunOutcome {
    pub sets: ReconciledSets,
    pub report: RunReport,
    pub artifact_paths: Vec<PathBuf>,
}

/// Execute one full reconciliation run.
pub fn run_pipeline(
    config: &PipelineConfig,
    upstox_source: &dyn SnapshotSource,
    dhan_source: &dyn SnapshotSource,
) -> Result<RunOutcome, RunError> {
    let started_at = chrono::Local::now().naive_local();

    // Fetch and persist both raw snapshots.
    let upstox_bytes = upstox_source.fetch()?;
    let dhan_bytes = dhan_source.fetch()?;
    let upstox_fingerprint = snapshot_fingerprint(&upstox_bytes);
    let dhan_fingerprint = snapshot_fingerprint(&dhan_bytes);
    let upstox_path = write_snapshot(&config.snapshot_dir, UPSTOX_SNAPSHOT, &upstox_bytes)?;
    let dhan_path = write_snapshot(&config.snapshot_dir, DHAN_SNAPSHOT, &dhan_bytes)?;

    // The two projections share no state; run them concurrently. This is a
    // wall-clock optimization only — output content and order are identical
    // to the sequential run.
    type Projected = Result<(Vec<CanonicalRecord>, ProjectionReport), RunError>;
    let (upstox_out, dhan_out): (Projected, Projected) = rayon::join(
        || {
            let df = read_snapshot(&upstox_path)?;
            Ok(project(&df, &UPSTOX)?)
        },
        || {
            let df = read_snapshot(&dhan_path)?;
            Ok(project(&df, &DHAN)?)
        },
    );
    let (upstox_records, upstox_projection) = upstox_out?;
    let (dhan_records, dhan_projection) = dhan_out?;

    let (a, upstox_dedupe) = dedupe(upstox_records);
    let (b, dhan_dedupe) = dedupe(dhan_records);

    let (sets, reconcile_report) = reconcile(&a, &b)?;

    // The partition validated; only now does anything get written downstream.
    let doc_store = DocumentStore::new(&config.doc_store_dir).upsert_all(&a)?;
    let mut sqlite = SqliteStore::open(&config.sqlite_path)?;
    let sqlite_rows = sqlite.upsert_all(&b)?;

    let report = RunReport {
        started_at,
        upstox: SourceReport {
            source_id: SourceId::Upstox,
            origin: upstox_source.describe(),
            snapshot_fingerprint: upstox_fingerprint,
            projection: upstox_projection,
            dedupe: upstox_dedupe,
        },
        dhan: SourceReport {
            source_id: SourceId::Dhan,
            origin: dhan_source.describe(),
            snapshot_fingerprint: dhan_fingerprint,
            projection: dhan_projection,
            dedupe: dhan_dedupe,
        },
        reconcile: reconcile_report,
        doc_store,
        sqlite_rows,
    };

    let mut artifact_paths =
        save_artifacts(&sets, &config.output_dir).map_err(|e| RunError::Export(e.to_string()))?;

    let report_json =
        serde_json::to_string_pretty(&report).map_err(|e| RunError::Export(e.to_string()))?;
    let report_path = config.output_dir.join(REPORT_FILE);
    std::fs::write(&report_path, report_json).map_err(|e| RunError::Export(e.to_string()))?;
    artifact_paths.push(report_path);

    Ok(RunOutcome {
        sets,
        report,
        artifact_paths,
    })
}
