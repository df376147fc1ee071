//! ScripDiff Core — canonical schema, normalization, and reconciliation.
//!
//! This crate contains the pure heart of the catalog reconciliation pipeline:
//! - Canonical instrument schema shared by both providers
//! - Trading-symbol normalization (the join key derivation)
//! - Declarative source-specific projection onto the canonical schema
//! - First-wins key deduplication
//! - Three-way partition (common / only-A / only-B) with invariant checks
//!
//! No I/O happens here. Raw tables come in as dataframes, canonical tables
//! go out as record vectors, and every stage returns a structured report of
//! its data-quality observations alongside its output.

pub mod dedupe;
pub mod normalize;
pub mod project;
pub mod reconcile;
pub mod schema;

pub use dedupe::{dedupe, DedupeReport};
pub use normalize::normalize_symbol;
pub use project::{project, ProjectError, ProjectionReport, SourceSpec, DHAN, UPSTOX};
pub use reconcile::{reconcile, ReconcileError, ReconcileReport, ReconciledSets};
pub use schema::{CanonicalRecord, SourceId, CANONICAL_COLUMNS, TARGET_EXCHANGE};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the ETL layer moves across threads
    /// (rayon projection fan-out) is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<schema::CanonicalRecord>();
        require_sync::<schema::CanonicalRecord>();
        require_send::<schema::SourceId>();
        require_sync::<schema::SourceId>();
        require_send::<project::ProjectionReport>();
        require_sync::<project::ProjectionReport>();
        require_send::<project::ProjectError>();
        require_sync::<project::ProjectError>();
        require_send::<dedupe::DedupeReport>();
        require_sync::<dedupe::DedupeReport>();
        require_send::<reconcile::ReconciledSets>();
        require_sync::<reconcile::ReconciledSets>();
    }
}
