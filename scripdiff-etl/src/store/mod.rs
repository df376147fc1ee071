//! Persistence sinks for the canonical tables.
//!
//! Both sinks upsert per record — a rerun updates what it already wrote,
//! it never appends duplicates.

pub mod docstore;
pub mod sqlite;

pub use docstore::{DocStoreSummary, DocumentStore};
pub use sqlite::SqliteStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(String),

    #[error("document serialization failed: {0}")]
    Serialize(String),

    #[error("sqlite error: {0}")]
    Sqlite(String),
}
