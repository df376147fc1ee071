//! ScripDiff ETL — the collaborators around the reconciliation core.
//!
//! Everything the core deliberately does not do lives here:
//! - Snapshot fetch (HTTP with bounded retry, gzip decode, local-file runs)
//! - CSV ingest into dataframes (all columns as strings; projection owns typing)
//! - Persistence sinks: JSON document store and SQLite, both upserting
//! - CSV artifact export for the three reconciled partitions
//! - TOML pipeline configuration
//! - The run orchestrator: fetch → ingest → project → dedupe → reconcile → sinks

pub mod config;
pub mod export;
pub mod fetch;
pub mod ingest;
pub mod pipeline;
pub mod store;

pub use config::PipelineConfig;
pub use fetch::{FileSource, HttpSource, SnapshotSource};
pub use pipeline::{run_pipeline, RunError, RunOutcome, RunReport, SourceReport};
