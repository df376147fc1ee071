//! CSV artifact export for the reconciled partitions.
//!
//! Three files per run: `common_stocks.csv`, `only_in_upstox.csv`,
//! `only_in_dhan.csv`. Each is a header row of the canonical columns followed
//! by one row per record; null fields serialize as empty cells.

use anyhow::{Context, Result};
use scripdiff_core::{CanonicalRecord, ReconciledSets, CANONICAL_COLUMNS};
use std::path::{Path, PathBuf};

pub const COMMON_FILE: &str = "common_stocks.csv";
pub const ONLY_A_FILE: &str = "only_in_upstox.csv";
pub const ONLY_B_FILE: &str = "only_in_dhan.csv";

/// Serialize one canonical table as CSV.
pub fn export_records_csv(records: &[CanonicalRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(CANONICAL_COLUMNS)?;
    for rec in records {
        wtr.write_record([
            rec.exchange.as_str(),
            rec.instrument_key.as_deref().unwrap_or(""),
            rec.symbol_name.as_deref().unwrap_or(""),
            rec.security_id.as_deref().unwrap_or(""),
            rec.short_name.as_deref().unwrap_or(""),
            rec.name.as_deref().unwrap_or(""),
            rec.isin.as_deref().unwrap_or(""),
            rec.trading_symbol.as_deref().unwrap_or(""),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write the three partition artifacts into `output_dir`.
///
/// Returns the paths written, in `common`, `only_a`, `only_b` order.
pub fn save_artifacts(sets: &ReconciledSets, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let files: [(&str, &[CanonicalRecord]); 3] = [
        (COMMON_FILE, &sets.common),
        (ONLY_A_FILE, &sets.only_a),
        (ONLY_B_FILE, &sets.only_b),
    ];

    let mut paths = Vec::with_capacity(files.len());
    for (name, records) in files {
        let csv = export_records_csv(records)?;
        let path = output_dir.join(name);
        std::fs::write(&path, &csv)
            .with_context(|| format!("failed to write {}", path.display()))?;
        paths.push(path);
    }
    Ok(paths)
}
