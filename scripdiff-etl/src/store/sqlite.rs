//! SQLite sink for the deduplicated Dhan table.
//!
//! Schema: the eight canonical columns, `security_id` as primary key,
//! `trading_symbol` declared unique. Loads are per-record upserts inside one
//! transaction — rerunning the pipeline updates rows in place.

use rusqlite::{params, Connection, OptionalExtension};
use scripdiff_core::CanonicalRecord;
use std::fs;
use std::path::Path;

use super::StoreError;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::Io(format!("create dir: {e}")))?;
            }
        }
        let conn = Connection::open(path).map_err(sql_err)?;
        Self::with_connection(conn)
    }

    /// In-memory database, for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(sql_err)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS dhan_nse (
                exchange TEXT NOT NULL,
                instrument_key TEXT,
                symbol_name TEXT,
                security_id TEXT PRIMARY KEY,
                short_name TEXT,
                name TEXT,
                isin TEXT,
                trading_symbol TEXT UNIQUE
            );
            "#,
        )
        .map_err(sql_err)?;
        Ok(Self { conn })
    }

    /// Upsert every record, keyed by `security_id`, in one transaction.
    pub fn upsert_all(&mut self, records: &[CanonicalRecord]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction().map_err(sql_err)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO dhan_nse (
                         exchange, instrument_key, symbol_name, security_id,
                         short_name, name, isin, trading_symbol
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT(security_id) DO UPDATE SET
                         exchange = excluded.exchange,
                         instrument_key = excluded.instrument_key,
                         symbol_name = excluded.symbol_name,
                         short_name = excluded.short_name,
                         name = excluded.name,
                         isin = excluded.isin,
                         trading_symbol = excluded.trading_symbol",
                )
                .map_err(sql_err)?;

            for rec in records {
                stmt.execute(params![
                    rec.exchange,
                    rec.instrument_key,
                    rec.symbol_name,
                    rec.security_id,
                    rec.short_name,
                    rec.name,
                    rec.isin,
                    rec.trading_symbol,
                ])
                .map_err(sql_err)?;
            }
        }
        tx.commit().map_err(sql_err)?;
        Ok(records.len())
    }

    /// Fetch one record by `security_id`.
    pub fn get(&self, security_id: &str) -> Result<Option<CanonicalRecord>, StoreError> {
        self.conn
            .query_row(
                "SELECT exchange, instrument_key, symbol_name, security_id,
                        short_name, name, isin, trading_symbol
                 FROM dhan_nse WHERE security_id = ?1",
                params![security_id],
                |row| {
                    Ok(CanonicalRecord {
                        exchange: row.get(0)?,
                        instrument_key: row.get(1)?,
                        symbol_name: row.get(2)?,
                        security_id: row.get(3)?,
                        short_name: row.get(4)?,
                        name: row.get(5)?,
                        isin: row.get(6)?,
                        trading_symbol: row.get(7)?,
                    })
                },
            )
            .optional()
            .map_err(sql_err)
    }

    /// Number of rows in the table.
    pub fn count(&self) -> Result<usize, StoreError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM dhan_nse", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n as usize)
            .map_err(sql_err)
    }
}

fn sql_err(e: rusqlite::Error) -> StoreError {
    StoreError::Sqlite(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(security_id: &str, symbol_name: &str) -> CanonicalRecord {
        CanonicalRecord {
            exchange: "NSE".into(),
            security_id: Some(security_id.into()),
            symbol_name: Some(symbol_name.into()),
            trading_symbol: Some(symbol_name.into()),
            ..Default::default()
        }
    }

    #[test]
    fn upsert_inserts_rows() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let n = store
            .upsert_all(&[rec("2885", "RELIANCE"), rec("11536", "TCS")])
            .unwrap();

        assert_eq!(n, 2);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn upsert_updates_existing_key_in_place() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_all(&[rec("2885", "RELIANCE")]).unwrap();

        let mut updated = rec("2885", "RELIANCE");
        updated.isin = Some("INE002A01018".into());
        store.upsert_all(&[updated]).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let row = store.get("2885").unwrap().unwrap();
        assert_eq!(row.isin.as_deref(), Some("INE002A01018"));
    }

    #[test]
    fn null_security_ids_do_not_collide() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut a = rec("x", "AAA");
        a.security_id = None;
        let mut b = rec("x", "BBB");
        b.security_id = None;

        store.upsert_all(&[a, b]).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn get_missing_row_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.get("0").unwrap().is_none());
    }

    #[test]
    fn reopening_on_disk_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nse.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.upsert_all(&[rec("2885", "RELIANCE")]).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }
}
