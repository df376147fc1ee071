//! Canonical instrument schema shared by both providers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The exchange this pipeline reconciles. Every canonical record carries it.
pub const TARGET_EXCHANGE: &str = "NSE";

/// Canonical output columns, in artifact order.
pub const CANONICAL_COLUMNS: [&str; 8] = [
    "exchange",
    "instrument_key",
    "symbol_name",
    "security_id",
    "short_name",
    "name",
    "isin",
    "trading_symbol",
];

/// The two catalog providers being reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceId {
    /// Source A — gzipped NSE instrument file.
    Upstox,
    /// Source B — scrip-master CSV.
    Dhan,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Upstox => "upstox",
            SourceId::Dhan => "dhan",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One instrument projected onto the canonical schema.
///
/// `trading_symbol` is the join key. It is optional straight out of
/// projection (a raw symbol can normalize to nothing); deduplication drops
/// the null-key records, so every record past that stage has `Some` key,
/// unique within its source table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub exchange: String,
    pub instrument_key: Option<String>,
    pub symbol_name: Option<String>,
    pub security_id: Option<String>,
    pub short_name: Option<String>,
    pub name: Option<String>,
    pub isin: Option<String>,
    pub trading_symbol: Option<String>,
}

impl CanonicalRecord {
    /// The normalized join key, if this record has one.
    pub fn key(&self) -> Option<&str> {
        self.trading_symbol.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_columns_order_matches_artifact_contract() {
        assert_eq!(CANONICAL_COLUMNS[0], "exchange");
        assert_eq!(CANONICAL_COLUMNS[7], "trading_symbol");
        assert_eq!(CANONICAL_COLUMNS.len(), 8);
    }

    #[test]
    fn record_key_is_trading_symbol() {
        let rec = CanonicalRecord {
            exchange: TARGET_EXCHANGE.into(),
            trading_symbol: Some("RELIANCE".into()),
            ..Default::default()
        };
        assert_eq!(rec.key(), Some("RELIANCE"));

        let keyless = CanonicalRecord::default();
        assert_eq!(keyless.key(), None);
    }

    #[test]
    fn source_id_display() {
        assert_eq!(SourceId::Upstox.to_string(), "upstox");
        assert_eq!(SourceId::Dhan.to_string(), "dhan");
    }

    #[test]
    fn record_json_roundtrip() {
        let rec = CanonicalRecord {
            exchange: TARGET_EXCHANGE.into(),
            instrument_key: Some("NSE_EQ|INE002A01018".into()),
            name: Some("Reliance Industries".into()),
            isin: Some("INE002A01018".into()),
            trading_symbol: Some("RELIANCE".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&rec).unwrap();
        let restored: CanonicalRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, restored);
    }
}
