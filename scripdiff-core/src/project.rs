//! Source-specific projection — raw provider tables onto the canonical schema.
//!
//! Each provider gets a declarative `SourceSpec`: exact-match row filters
//! (exchange and instrument class), plus one mapping per canonical field with
//! an explicit absence policy. A missing filter or join column is fatal; a
//! missing optional column projects to null and is reported.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::normalize_symbol;
use crate::schema::{CanonicalRecord, SourceId, TARGET_EXCHANGE};

/// What to do when a mapped source column is absent from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnMissing {
    /// The schema assumption is violated and cannot be repaired locally.
    Fatal,
    /// Project the canonical field as null and report the absence.
    Null,
}

/// Canonical fields a provider column can project into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalField {
    InstrumentKey,
    SymbolName,
    SecurityId,
    ShortName,
    Name,
    Isin,
    TradingSymbol,
}

/// One canonical field's source column and absence policy.
#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub field: CanonicalField,
    /// `None` means the provider has no corresponding column at all.
    pub source_column: Option<&'static str>,
    pub on_missing: OnMissing,
}

/// Exact-match row filter on a provider column.
#[derive(Debug, Clone, Copy)]
pub struct RowFilter {
    pub column: &'static str,
    pub equals: &'static str,
}

/// Declarative projection spec for one provider.
pub struct SourceSpec {
    pub source_id: SourceId,
    pub filters: &'static [RowFilter],
    pub fields: &'static [FieldMapping],
    /// Providers without a display-name column use the normalized key as
    /// `symbol_name`.
    pub symbol_name_from_key: bool,
}

/// Upstox NSE instrument file.
pub const UPSTOX: SourceSpec = SourceSpec {
    source_id: SourceId::Upstox,
    filters: &[
        RowFilter { column: "exchange", equals: "NSE_EQ" },
        RowFilter { column: "instrument_type", equals: "EQUITY" },
    ],
    fields: &[
        FieldMapping {
            field: CanonicalField::InstrumentKey,
            source_column: Some("instrument_key"),
            on_missing: OnMissing::Null,
        },
        FieldMapping {
            field: CanonicalField::ShortName,
            source_column: Some("short_name"),
            on_missing: OnMissing::Null,
        },
        FieldMapping {
            field: CanonicalField::Name,
            source_column: Some("name"),
            on_missing: OnMissing::Null,
        },
        FieldMapping {
            field: CanonicalField::Isin,
            source_column: Some("isin"),
            on_missing: OnMissing::Null,
        },
        FieldMapping {
            field: CanonicalField::SecurityId,
            source_column: None,
            on_missing: OnMissing::Null,
        },
        FieldMapping {
            field: CanonicalField::TradingSymbol,
            source_column: Some("tradingsymbol"),
            on_missing: OnMissing::Fatal,
        },
    ],
    symbol_name_from_key: true,
};

/// Dhan scrip master.
pub const DHAN: SourceSpec = SourceSpec {
    source_id: SourceId::Dhan,
    filters: &[
        RowFilter { column: "SEM_EXM_EXCH_ID", equals: "NSE" },
        RowFilter { column: "SEM_INSTRUMENT_NAME", equals: "EQUITY" },
    ],
    fields: &[
        FieldMapping {
            field: CanonicalField::SecurityId,
            source_column: Some("SEM_SMST_SECURITY_ID"),
            on_missing: OnMissing::Null,
        },
        FieldMapping {
            field: CanonicalField::SymbolName,
            source_column: Some("SM_SYMBOL_NAME"),
            on_missing: OnMissing::Null,
        },
        FieldMapping {
            field: CanonicalField::InstrumentKey,
            source_column: None,
            on_missing: OnMissing::Null,
        },
        FieldMapping {
            field: CanonicalField::ShortName,
            source_column: None,
            on_missing: OnMissing::Null,
        },
        FieldMapping {
            field: CanonicalField::Name,
            source_column: None,
            on_missing: OnMissing::Null,
        },
        FieldMapping {
            field: CanonicalField::Isin,
            source_column: None,
            on_missing: OnMissing::Null,
        },
        FieldMapping {
            field: CanonicalField::TradingSymbol,
            source_column: Some("SEM_TRADING_SYMBOL"),
            on_missing: OnMissing::Fatal,
        },
    ],
    symbol_name_from_key: false,
};

/// Structured errors from projection.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("{source_id} snapshot is missing required column '{column}'")]
    SchemaViolation { source_id: SourceId, column: String },

    #[error("{source_id} table read failed: {reason}")]
    TableRead { source_id: SourceId, reason: String },
}

/// Data-quality observations from one projection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionReport {
    pub source_id: SourceId,
    pub raw_rows: usize,
    pub kept_rows: usize,
    /// Optional source columns absent from this snapshot (projected as null).
    pub nulled_columns: Vec<String>,
    pub warnings: Vec<String>,
}

/// Filter a raw provider table and project it onto the canonical schema.
///
/// Zero surviving rows is reported, not fatal; downstream stages accept
/// empty tables. A missing filter or join column aborts with
/// `SchemaViolation`.
pub fn project(
    df: &DataFrame,
    spec: &SourceSpec,
) -> Result<(Vec<CanonicalRecord>, ProjectionReport), ProjectError> {
    let schema = df.schema();

    // Policy pass: every fatal column must exist before any row is touched.
    for filter in spec.filters {
        if !schema.contains(filter.column) {
            return Err(ProjectError::SchemaViolation {
                source_id: spec.source_id,
                column: filter.column.to_string(),
            });
        }
    }
    for mapping in spec.fields {
        if let (Some(column), OnMissing::Fatal) = (mapping.source_column, mapping.on_missing) {
            if !schema.contains(column) {
                return Err(ProjectError::SchemaViolation {
                    source_id: spec.source_id,
                    column: column.to_string(),
                });
            }
        }
    }

    let mut predicate = lit(true);
    for filter in spec.filters {
        predicate = predicate.and(col(filter.column).eq(lit(filter.equals)));
    }
    let filtered = df
        .clone()
        .lazy()
        .filter(predicate)
        .collect()
        .map_err(|e| ProjectError::TableRead {
            source_id: spec.source_id,
            reason: e.to_string(),
        })?;

    let n = filtered.height();
    let mut report = ProjectionReport {
        source_id: spec.source_id,
        raw_rows: df.height(),
        kept_rows: n,
        nulled_columns: Vec::new(),
        warnings: Vec::new(),
    };
    if n == 0 {
        report.warnings.push(format!(
            "no {TARGET_EXCHANGE} equity rows survived the {} filter",
            spec.source_id
        ));
    }

    let filtered_schema = filtered.schema();
    let mut columns: Vec<(CanonicalField, Vec<Option<String>>)> = Vec::with_capacity(spec.fields.len());
    for mapping in spec.fields {
        let values = match mapping.source_column {
            Some(column) if filtered_schema.contains(column) => {
                utf8_column(&filtered, spec.source_id, column)?
            }
            Some(column) => {
                report.nulled_columns.push(column.to_string());
                vec![None; n]
            }
            None => vec![None; n],
        };
        columns.push((mapping.field, values));
    }

    let mut records = Vec::with_capacity(n);
    for i in 0..n {
        let mut rec = CanonicalRecord {
            exchange: TARGET_EXCHANGE.to_string(),
            ..Default::default()
        };
        for (field, values) in &columns {
            let value = values[i].clone();
            match field {
                CanonicalField::InstrumentKey => rec.instrument_key = value,
                CanonicalField::SymbolName => rec.symbol_name = value,
                CanonicalField::SecurityId => rec.security_id = value,
                CanonicalField::ShortName => rec.short_name = value,
                CanonicalField::Name => rec.name = value,
                CanonicalField::Isin => rec.isin = value,
                CanonicalField::TradingSymbol => {
                    rec.trading_symbol = normalize_symbol(value.as_deref());
                }
            }
        }
        if spec.symbol_name_from_key {
            rec.symbol_name = rec.trading_symbol.clone();
        }
        records.push(rec);
    }

    Ok((records, report))
}

/// Read one column as strings, casting whatever the CSV reader inferred.
fn utf8_column(
    df: &DataFrame,
    source_id: SourceId,
    column: &str,
) -> Result<Vec<Option<String>>, ProjectError> {
    let casted = df
        .column(column)
        .map_err(|e| table_read(source_id, column, e))?
        .cast(&DataType::String)
        .map_err(|e| table_read(source_id, column, e))?;
    let ca = casted.str().map_err(|e| table_read(source_id, column, e))?;
    Ok(ca.iter().map(|v| v.map(str::to_owned)).collect())
}

fn table_read(source_id: SourceId, column: &str, e: PolarsError) -> ProjectError {
    ProjectError::TableRead {
        source_id,
        reason: format!("column '{column}': {e}"),
    }
}
