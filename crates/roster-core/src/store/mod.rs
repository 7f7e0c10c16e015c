//! Local replica of previously seen employees.
//!
//! Consulted only as a fallback and written only after an upstream success.
//! Writes are upserts by id, so duplicate fills from racing resolutions are harmless.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::types::Employee;

mod schema;

/// Durable key/value replica of employee records.
pub trait LocalStore: Send + Sync {
    fn find_all(&self) -> StoreResult<Vec<Employee>>;

    fn find_by_id(&self, id: i64) -> StoreResult<Option<Employee>>;

    fn save(&self, employee: &Employee) -> StoreResult<Employee>;

    /// Upsert a batch atomically.
    fn save_all(&self, employees: &[Employee]) -> StoreResult<Vec<Employee>>;

    fn find_by_name_containing(
        &self,
        needle: &str,
        case_insensitive: bool,
    ) -> StoreResult<Vec<Employee>>;

    /// Records refreshed from the upstream strictly after `timestamp`.
    fn find_updated_after(&self, timestamp: DateTime<Utc>) -> StoreResult<Vec<Employee>>;
}

const SELECT_COLUMNS: &str = "SELECT id, name, age, salary, profile_image, last_updated FROM employees";

const UPSERT: &str = r#"
    INSERT INTO employees (id, name, age, salary, profile_image, annual_salary, last_updated)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT(id) DO UPDATE SET
        name = excluded.name,
        age = excluded.age,
        salary = excluded.salary,
        profile_image = excluded.profile_image,
        annual_salary = excluded.annual_salary,
        last_updated = excluded.last_updated
"#;

/// SQLite-backed replica.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open a file-backed store.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Create an in-memory store (for testing).
    pub fn memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> StoreResult<Self> {
        schema::init_connection_impl(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn query(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> StoreResult<Vec<Employee>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, row_to_parts)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RowParts::into_employee).collect()
    }
}

impl LocalStore for SqliteStore {
    fn find_all(&self) -> StoreResult<Vec<Employee>> {
        self.query(&format!("{SELECT_COLUMNS} ORDER BY id"), &[])
    }

    fn find_by_id(&self, id: i64) -> StoreResult<Option<Employee>> {
        let conn = self.lock()?;
        let parts = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                row_to_parts,
            )
            .optional()?;
        parts.map(RowParts::into_employee).transpose()
    }

    fn save(&self, employee: &Employee) -> StoreResult<Employee> {
        let conn = self.lock()?;
        upsert(&conn, employee)?;
        debug!(id = employee.id, "saved employee to local store");
        Ok(employee.clone())
    }

    fn save_all(&self, employees: &[Employee]) -> StoreResult<Vec<Employee>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for employee in employees {
            upsert(&tx, employee)?;
        }
        tx.commit()?;
        debug!(count = employees.len(), "saved employee batch to local store");
        Ok(employees.to_vec())
    }

    fn find_by_name_containing(
        &self,
        needle: &str,
        case_insensitive: bool,
    ) -> StoreResult<Vec<Employee>> {
        let sql = if case_insensitive {
            format!("{SELECT_COLUMNS} WHERE instr(lower(name), lower(?1)) > 0 ORDER BY id")
        } else {
            format!("{SELECT_COLUMNS} WHERE instr(name, ?1) > 0 ORDER BY id")
        };
        self.query(&sql, &[&needle])
    }

    fn find_updated_after(&self, timestamp: DateTime<Utc>) -> StoreResult<Vec<Employee>> {
        let bound = encode_timestamp(timestamp);
        self.query(
            &format!("{SELECT_COLUMNS} WHERE last_updated > ?1 ORDER BY id"),
            &[&bound],
        )
    }
}

fn upsert(conn: &Connection, employee: &Employee) -> StoreResult<()> {
    conn.execute(
        UPSERT,
        params![
            employee.id,
            employee.name,
            employee.age,
            employee.salary,
            employee.profile_image,
            employee.annual_salary,
            employee.last_updated.map(encode_timestamp),
        ],
    )?;
    Ok(())
}

/// Fixed-width UTC form so text comparison orders like time.
fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(text: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Timestamp(format!("{text}: {e}")))
}

struct RowParts {
    id: i64,
    name: Option<String>,
    age: Option<u32>,
    salary: Option<f64>,
    profile_image: Option<String>,
    last_updated: Option<String>,
}

impl RowParts {
    /// The stored annual salary is not trusted; it is derived again here.
    fn into_employee(self) -> StoreResult<Employee> {
        let last_updated = self.last_updated.as_deref().map(decode_timestamp).transpose()?;
        Ok(Employee {
            id: self.id,
            name: self.name,
            age: self.age,
            salary: self.salary,
            profile_image: self.profile_image,
            annual_salary: None,
            last_updated,
        }
        .with_derived())
    }
}

fn row_to_parts(row: &rusqlite::Row<'_>) -> rusqlite::Result<RowParts> {
    Ok(RowParts {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        salary: row.get(3)?,
        profile_image: row.get(4)?,
        last_updated: row.get(5)?,
    })
}
