//! First-wins key deduplication.
//!
//! Guarantees the uniqueness invariant the reconciler depends on: after this
//! stage a source table has one record per trading symbol, and no record
//! without one. The earliest record in original row order wins; later
//! duplicates are discarded, counted, and sampled for diagnostics.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::schema::CanonicalRecord;

/// How many discarded duplicate rows to keep verbatim in the report.
pub const DISCARD_SAMPLE_LIMIT: usize = 5;

/// Data-quality observations from one dedupe pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DedupeReport {
    pub input_rows: usize,
    /// Records dropped because normalization yielded no key.
    pub null_key_drops: usize,
    /// Records discarded because an earlier row already claimed their key.
    pub duplicate_drops: usize,
    /// The distinct keys that had duplicates.
    pub duplicate_keys: Vec<String>,
    /// Up to `DISCARD_SAMPLE_LIMIT` of the discarded rows, verbatim.
    pub discard_samples: Vec<CanonicalRecord>,
}

impl DedupeReport {
    pub fn rows_lost(&self) -> usize {
        self.null_key_drops + self.duplicate_drops
    }
}

/// Enforce key uniqueness on a canonical table, first-wins.
///
/// The discard policy is deliberate: keep the earliest-encountered record in
/// original row order. Downstream consumers depend on this being
/// deterministic and order-dependent, so it must not be replaced with
/// last-wins or field merging.
pub fn dedupe(records: Vec<CanonicalRecord>) -> (Vec<CanonicalRecord>, DedupeReport) {
    let mut report = DedupeReport {
        input_rows: records.len(),
        ..Default::default()
    };

    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut kept = Vec::with_capacity(records.len());

    for rec in records {
        let Some(key) = rec.key() else {
            report.null_key_drops += 1;
            continue;
        };
        if seen.contains(key) {
            report.duplicate_drops += 1;
            if !report.duplicate_keys.iter().any(|k| k == key) {
                report.duplicate_keys.push(key.to_string());
            }
            if report.discard_samples.len() < DISCARD_SAMPLE_LIMIT {
                report.discard_samples.push(rec.clone());
            }
            continue;
        }
        seen.insert(key.to_string());
        kept.push(rec);
    }

    (kept, report)
}
