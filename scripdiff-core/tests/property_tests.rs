//! Property tests for the reconciliation core invariants.
//!
//! Uses proptest to verify:
//! 1. Normalizer idempotence and the shape of produced keys
//! 2. Dedupe idempotence, uniqueness, and row accounting
//! 3. Partition disjointness, union coverage, and common cardinality

use proptest::prelude::*;
use scripdiff_core::{dedupe, normalize_symbol, reconcile, CanonicalRecord};
use std::collections::HashSet;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_raw_symbol() -> impl Strategy<Value = String> {
    prop_oneof![
        // Plain-ish tickers with the punctuation the sources actually emit
        "[A-Za-z0-9&#\\-\\. ]{0,14}",
        // Explicitly suffixed symbols
        "[A-Za-z]{1,8}-(EQ|BE|RE|SM|ST|N1|N2|N3)",
        // Anything at all
        any::<String>(),
    ]
}

/// Small key space so duplicates and overlaps actually happen.
fn arb_keys() -> impl Strategy<Value = Vec<Option<String>>> {
    prop::collection::vec(
        prop_oneof![
            1 => Just(None::<String>),
            6 => "[A-Z]{1,2}".prop_map(Some),
        ],
        0..40,
    )
}

fn record(key: Option<String>) -> CanonicalRecord {
    CanonicalRecord {
        exchange: "NSE".into(),
        trading_symbol: key,
        ..Default::default()
    }
}

fn key_set(records: &[CanonicalRecord]) -> HashSet<String> {
    records
        .iter()
        .filter_map(|r| r.key().map(str::to_owned))
        .collect()
}

// ── 1. Normalizer ────────────────────────────────────────────────────

proptest! {
    /// normalize(normalize(s)) == normalize(s) whenever a key is produced.
    #[test]
    fn normalize_is_idempotent(raw in arb_raw_symbol()) {
        if let Some(key) = normalize_symbol(Some(&raw)) {
            prop_assert_eq!(normalize_symbol(Some(&key)), Some(key.clone()));
        }
    }

    /// A produced key is non-empty and contains only uppercase
    /// alphanumerics and `&`.
    #[test]
    fn normalized_keys_have_canonical_shape(raw in arb_raw_symbol()) {
        if let Some(key) = normalize_symbol(Some(&raw)) {
            prop_assert!(!key.is_empty());
            prop_assert!(key
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '&'));
        }
    }
}

// ── 2. Deduplicator ──────────────────────────────────────────────────

proptest! {
    /// After dedupe every key is unique and non-null, and every input row
    /// is either kept or accounted for in the report.
    #[test]
    fn dedupe_enforces_uniqueness_and_accounts_for_rows(keys in arb_keys()) {
        let input: Vec<_> = keys.into_iter().map(record).collect();
        let input_len = input.len();

        let (kept, report) = dedupe(input);

        let mut seen = HashSet::new();
        for rec in &kept {
            let key = rec.key().expect("null key survived dedupe");
            prop_assert!(seen.insert(key.to_owned()), "duplicate key survived: {key}");
        }
        prop_assert_eq!(kept.len() + report.rows_lost(), input_len);
    }

    /// dedupe(dedupe(t)) == dedupe(t).
    #[test]
    fn dedupe_is_idempotent(keys in arb_keys()) {
        let input: Vec<_> = keys.into_iter().map(record).collect();
        let (once, _) = dedupe(input);
        let (twice, second_report) = dedupe(once.clone());

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(second_report.rows_lost(), 0);
    }
}

// ── 3. Reconciler ────────────────────────────────────────────────────

proptest! {
    /// The three key-sets are pairwise disjoint and their union is exactly
    /// keys(A) ∪ keys(B); common has one row per shared key.
    #[test]
    fn partition_is_disjoint_and_covers_union(
        a_keys in arb_keys(),
        b_keys in arb_keys(),
    ) {
        let (a, _) = dedupe(a_keys.into_iter().map(record).collect());
        let (b, _) = dedupe(b_keys.into_iter().map(record).collect());

        let (sets, report) = reconcile(&a, &b).expect("reconcile failed on deduped input");
        prop_assert!(report.fanout_repairs.is_empty());

        let common = key_set(&sets.common);
        let only_a = key_set(&sets.only_a);
        let only_b = key_set(&sets.only_b);

        prop_assert!(common.is_disjoint(&only_a));
        prop_assert!(common.is_disjoint(&only_b));
        prop_assert!(only_a.is_disjoint(&only_b));

        let a_set = key_set(&a);
        let b_set = key_set(&b);
        let union: HashSet<_> = common.union(&only_a).chain(&only_b).cloned().collect();
        let expected: HashSet<_> = a_set.union(&b_set).cloned().collect();
        prop_assert_eq!(union, expected);

        prop_assert_eq!(sets.common.len(), a_set.intersection(&b_set).count());
    }

    /// An empty A side passes B through untouched.
    #[test]
    fn empty_side_degenerates(b_keys in arb_keys()) {
        let (b, _) = dedupe(b_keys.into_iter().map(record).collect());
        let (sets, _) = reconcile(&[], &b).expect("reconcile failed");

        prop_assert!(sets.common.is_empty());
        prop_assert!(sets.only_a.is_empty());
        prop_assert_eq!(sets.only_b.len(), b.len());
    }
}
