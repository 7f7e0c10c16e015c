//! Schema for the local replica.

use rusqlite::Connection;

use crate::error::StoreResult;

pub(crate) const EMPLOYEE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS employees (
    id              INTEGER PRIMARY KEY,
    name            TEXT,
    age             INTEGER,
    salary          REAL,
    profile_image   TEXT,
    annual_salary   REAL,
    last_updated    TEXT
);

CREATE INDEX IF NOT EXISTS idx_employees_last_updated ON employees(last_updated);
"#;

pub(crate) fn init_connection_impl(conn: &Connection) -> StoreResult<()> {
    // WAL mode for file-backed DBs (no-op for in-memory)
    let _ = conn.execute_batch("PRAGMA journal_mode = WAL");
    let _ = conn.execute_batch("PRAGMA busy_timeout = 5000");
    conn.execute_batch(EMPLOYEE_SCHEMA)?;
    Ok(())
}
