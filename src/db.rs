use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS imported_rows (
    fingerprint TEXT PRIMARY KEY,
    row_json TEXT NOT NULL,
    recorded_at TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);
";

/// Opens the store and takes the SQLite lock for the lifetime of the
/// connection. A second run against the same file fails at once instead of
/// racing or waiting.
pub fn get_connection(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(Duration::ZERO)?;
    conn.execute_batch("PRAGMA locking_mode=EXCLUSIVE; PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch("BEGIN EXCLUSIVE;")?;
    conn.execute_batch(SCHEMA)?;
    conn.execute_batch("COMMIT;")?;
    Ok(())
}
