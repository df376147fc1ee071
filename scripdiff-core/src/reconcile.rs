//! Three-way partition of two deduplicated canonical tables.
//!
//! `reconcile` computes `common` (keys in both sources, fields merged with a
//! fixed precedence), `only_a`, and `only_b`. Inputs must already satisfy the
//! deduplicator's post-condition; violations are detected defensively rather
//! than trusted away.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::schema::CanonicalRecord;

/// The run's terminal artifact: three disjoint canonical tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconciledSets {
    pub common: Vec<CanonicalRecord>,
    pub only_a: Vec<CanonicalRecord>,
    pub only_b: Vec<CanonicalRecord>,
}

/// Observations from one reconcile pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub a_keys: usize,
    pub b_keys: usize,
    pub common_rows: usize,
    pub only_a_rows: usize,
    pub only_b_rows: usize,
    /// Duplicate keys that slipped past deduplication and were repaired
    /// first-wins here. Anything in this list points at an upstream bug.
    pub fanout_repairs: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("partition invariant violated: {0}")]
    InvariantViolation(String),
}

/// Compute the three-way partition over two deduplicated tables.
///
/// Row order is deterministic: `common` and `only_a` follow A's row order,
/// `only_b` follows B's. If either input is empty the other passes through
/// unchanged and `common` is empty.
pub fn reconcile(
    a: &[CanonicalRecord],
    b: &[CanonicalRecord],
) -> Result<(ReconciledSets, ReconcileReport), ReconcileError> {
    let mut report = ReconcileReport::default();

    let a_unique = first_wins(a, "A", &mut report.fanout_repairs)?;
    let b_unique = first_wins(b, "B", &mut report.fanout_repairs)?;

    let mut b_index: HashMap<&str, &CanonicalRecord> = HashMap::with_capacity(b_unique.len());
    for &rec in &b_unique {
        if let Some(key) = rec.key() {
            b_index.insert(key, rec);
        }
    }
    let a_keys: HashSet<&str> = a_unique.iter().filter_map(|r| r.key()).collect();

    let mut sets = ReconciledSets::default();
    for &rec in &a_unique {
        let Some(key) = rec.key() else { continue };
        match b_index.get(key) {
            Some(&b_rec) => sets.common.push(merge(rec, b_rec, key)),
            None => sets.only_a.push(rec.clone()),
        }
    }
    for &rec in &b_unique {
        let Some(key) = rec.key() else { continue };
        if !a_keys.contains(key) {
            sets.only_b.push(rec.clone());
        }
    }

    report.a_keys = a_unique.len();
    report.b_keys = b_unique.len();
    report.common_rows = sets.common.len();
    report.only_a_rows = sets.only_a.len();
    report.only_b_rows = sets.only_b.len();

    validate_partition(&sets, &a_keys, &b_index)?;

    Ok((sets, report))
}

/// Merge one matched pair into a single canonical row.
///
/// Precedence is intentionally asymmetric: provider B is the source of truth
/// for `security_id` and the display `symbol_name`; everything else comes
/// from the A-side record. Do not "fix" this to a symmetric merge.
fn merge(a: &CanonicalRecord, b: &CanonicalRecord, key: &str) -> CanonicalRecord {
    CanonicalRecord {
        exchange: a.exchange.clone(),
        instrument_key: a.instrument_key.clone(),
        symbol_name: b.symbol_name.clone(),
        security_id: b.security_id.clone(),
        short_name: a.short_name.clone(),
        name: a.name.clone(),
        isin: a.isin.clone(),
        trading_symbol: Some(key.to_string()),
    }
}

/// Re-apply first-wins over an allegedly deduplicated input.
///
/// A duplicate here means deduplication was skipped or broken upstream; the
/// partition is repaired rather than multiplied, and the repair is recorded.
/// A null key is unrepairable and fatal.
fn first_wins<'t>(
    records: &'t [CanonicalRecord],
    side: &str,
    repairs: &mut Vec<String>,
) -> Result<Vec<&'t CanonicalRecord>, ReconcileError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());
    let mut out = Vec::with_capacity(records.len());
    for rec in records {
        let key = rec.key().ok_or_else(|| {
            ReconcileError::InvariantViolation(format!(
                "record with null trading_symbol reached the reconciler from side {side}"
            ))
        })?;
        if !seen.insert(key) {
            repairs.push(format!("duplicate key '{key}' in deduplicated {side} input"));
            continue;
        }
        out.push(rec);
    }
    Ok(out)
}

/// Defensive post-condition checks: exact common cardinality, pairwise
/// disjoint key-sets, and the union covering both inputs.
fn validate_partition(
    sets: &ReconciledSets,
    a_keys: &HashSet<&str>,
    b_index: &HashMap<&str, &CanonicalRecord>,
) -> Result<(), ReconcileError> {
    let expected_common = a_keys.iter().filter(|k| b_index.contains_key(*k)).count();
    if sets.common.len() != expected_common {
        return Err(ReconcileError::InvariantViolation(format!(
            "common has {} rows for {} matched keys",
            sets.common.len(),
            expected_common
        )));
    }

    let common: HashSet<&str> = sets.common.iter().filter_map(|r| r.key()).collect();
    let only_a: HashSet<&str> = sets.only_a.iter().filter_map(|r| r.key()).collect();
    let only_b: HashSet<&str> = sets.only_b.iter().filter_map(|r| r.key()).collect();

    if !common.is_disjoint(&only_a) || !common.is_disjoint(&only_b) || !only_a.is_disjoint(&only_b)
    {
        return Err(ReconcileError::InvariantViolation(
            "partition key-sets are not pairwise disjoint".into(),
        ));
    }

    let mut union: HashSet<&str> = HashSet::new();
    union.extend(&common);
    union.extend(&only_a);
    union.extend(&only_b);
    let mut expected: HashSet<&str> = a_keys.iter().copied().collect();
    expected.extend(b_index.keys().copied());
    if union != expected {
        return Err(ReconcileError::InvariantViolation(
            "partition key-sets do not cover the union of both inputs".into(),
        ));
    }

    Ok(())
}
