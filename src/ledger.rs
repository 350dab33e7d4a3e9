use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::models::Row;

/// Durable fingerprint -> row index of everything already submitted.
/// Entries are only ever inserted.
pub struct LocalLedger {
    conn: Connection,
}

impl LocalLedger {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = get_connection(path)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn exists(&self, fingerprint: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT 1 FROM imported_rows WHERE fingerprint = ?1")?;
        Ok(stmt.exists([fingerprint])?)
    }

    /// The row JSON recorded under this fingerprint.
    pub fn get(&self, fingerprint: &str) -> Result<Option<String>> {
        let row_json = self
            .conn
            .query_row(
                "SELECT row_json FROM imported_rows WHERE fingerprint = ?1",
                [fingerprint],
                |row| row.get(0),
            )
            .optional()?;
        Ok(row_json)
    }

    /// Single INSERT, so a crash either leaves no entry or a complete one.
    /// Recording a fingerprint twice is a storage error.
    pub fn record(&self, fingerprint: &str, row: &Row) -> Result<()> {
        let row_json = serde_json::to_string(row)?;
        self.conn.execute(
            "INSERT INTO imported_rows (fingerprint, row_json) VALUES (?1, ?2)",
            rusqlite::params![fingerprint, row_json],
        )?;
        Ok(())
    }

    pub fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT count(*) FROM imported_rows", [], |r| r.get(0))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImportError;

    fn sample_row() -> Row {
        Row::new(vec![
            ("transactionDate".to_string(), "01.01.2024 10:00".to_string()),
            ("amount".to_string(), "1500,00".to_string()),
        ])
    }

    #[test]
    fn test_record_then_exists() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = LocalLedger::open(&dir.path().join("ledger.db")).unwrap();
        assert!(!ledger.exists("abc").unwrap());
        ledger.record("abc", &sample_row()).unwrap();
        assert!(ledger.exists("abc").unwrap());
        assert!(!ledger.exists("abd").unwrap());
        assert_eq!(ledger.count().unwrap(), 1);
    }

    #[test]
    fn test_get_returns_row_json() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = LocalLedger::open(&dir.path().join("ledger.db")).unwrap();
        ledger.record("abc", &sample_row()).unwrap();
        assert_eq!(
            ledger.get("abc").unwrap().as_deref(),
            Some(r#"{"transactionDate":"01.01.2024 10:00","amount":"1500,00"}"#)
        );
        assert_eq!(ledger.get("missing").unwrap(), None);
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        {
            let ledger = LocalLedger::open(&path).unwrap();
            ledger.record("abc", &sample_row()).unwrap();
        }
        let ledger = LocalLedger::open(&path).unwrap();
        assert!(ledger.exists("abc").unwrap());
        assert_eq!(ledger.count().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_record_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = LocalLedger::open(&dir.path().join("ledger.db")).unwrap();
        ledger.record("abc", &sample_row()).unwrap();
        let err = ledger.record("abc", &sample_row()).unwrap_err();
        assert!(matches!(err, ImportError::Db(_)));
        assert_eq!(ledger.count().unwrap(), 1);
    }

    #[test]
    fn test_second_open_while_in_use_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let first = LocalLedger::open(&path).unwrap();
        first.record("abc", &sample_row()).unwrap();

        let second = LocalLedger::open(&path);
        assert!(matches!(second, Err(ImportError::Db(_))));

        drop(first);
        let reopened = LocalLedger::open(&path).unwrap();
        assert!(reopened.exists("abc").unwrap());
    }
}
