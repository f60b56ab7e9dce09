//! SQLite backend
//!
//! The database lives at `.desk/desk.db` by default. The schema is created
//! from [`schema::TABLES`] on first open and versioned through
//! `PRAGMA user_version`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde_json::Value;

use super::client::Backend;
use super::error::{BatchError, QueryError};
use super::query::{Query, Row};
use super::schema::{self, TableDef};

/// SQLite-backed store
pub struct SqliteBackend {
    /// Path to the database file (`None` for in-memory databases)
    path: Option<PathBuf>,

    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Schema version - bump when the table definitions change
    const SCHEMA_VERSION: i32 = 1;

    /// Opens (or creates) the database file at `path`
    pub fn open(path: &Path) -> Result<Self, QueryError> {
        let conn = Connection::open(path)?;

        // WAL lets readers proceed while another process writes
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::with_connection(conn, Some(path.to_path_buf()))
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self, QueryError> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self, QueryError> {
        ensure_schema(&conn)?;
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, QueryError> {
        self.conn
            .lock()
            .map_err(|_| QueryError::Unknown("database connection lock poisoned".into()))
    }
}

fn ensure_schema(conn: &Connection) -> Result<(), QueryError> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    match version {
        0 => {
            let ddl: String = schema::TABLES.iter().map(TableDef::ddl).collect();
            conn.execute_batch(&ddl)?;
            conn.execute(
                &format!("PRAGMA user_version = {}", SqliteBackend::SCHEMA_VERSION),
                [],
            )?;
            tracing::info!(version = SqliteBackend::SCHEMA_VERSION, "created database schema");
            Ok(())
        }
        v if v == SqliteBackend::SCHEMA_VERSION => Ok(()),
        v => Err(QueryError::Unknown(format!(
            "database schema version {} is not supported (expected {})",
            v,
            SqliteBackend::SCHEMA_VERSION
        ))),
    }
}

fn to_sql(column: &str, value: &Value) -> Result<SqlValue, QueryError> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(SqlValue::Integer(i)),
            None => Ok(SqlValue::Real(n.as_f64().unwrap_or(0.0))),
        },
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(QueryError::MalformedQuery(format!(
            "value for '{}' must be a scalar",
            column
        ))),
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Builds the SELECT statement and its parameters; identifiers are
/// validated before they reach the SQL text
fn select_sql(query: &Query, def: &TableDef) -> Result<(String, Vec<String>, Vec<SqlValue>), QueryError> {
    let columns = query.output_columns(def);
    let mut sql = format!("SELECT {} FROM {}", columns.join(", "), def.name);
    let mut params = Vec::new();

    let mut clauses = Vec::new();
    for filter in query.filters() {
        if filter.value.is_null() {
            clauses.push(format!("{} IS NULL", filter.column));
        } else {
            params.push(to_sql(&filter.column, &filter.value)?);
            clauses.push(format!("{} = ?{}", filter.column, params.len()));
        }
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    if let Some(order) = query.order_by() {
        let direction = if order.direction.is_ascending() { "ASC" } else { "DESC" };
        sql.push_str(&format!(" ORDER BY {} {}", order.column, direction));
    }

    if let Some(limit) = query.row_limit() {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    Ok((sql, columns, params))
}

fn check_columns<'a>(
    def: &TableDef,
    columns: impl IntoIterator<Item = &'a String>,
) -> Result<(), QueryError> {
    for column in columns {
        if def.column(column).is_none() {
            return Err(QueryError::MalformedQuery(format!(
                "unknown column '{}.{}'",
                def.name, column
            )));
        }
    }
    Ok(())
}

fn table_def(table: &str) -> Result<&'static TableDef, QueryError> {
    schema::table(table)
        .ok_or_else(|| QueryError::MalformedQuery(format!("unknown table '{}'", table)))
}

impl Backend for SqliteBackend {
    fn execute(&self, query: &Query) -> Result<Vec<Row>, QueryError> {
        let def = query.validate()?;
        let (sql, columns, params) = select_sql(query, def)?;

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let mut out = Row::new();
                for (i, column) in columns.iter().enumerate() {
                    out.insert(column.clone(), from_sql(row.get_ref(i)?));
                }
                Ok(out)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn insert_many(&self, table: &str, rows: &[Row]) -> Result<(), BatchError> {
        let def = table_def(table)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for (index, row) in rows.iter().enumerate() {
            let (sql, params) = insert_sql(def, row).map_err(|e| BatchError::at(index, e))?;
            tx.execute(&sql, params_from_iter(params.iter()))
                .map_err(|e| BatchError::at(index, e.into()))?;
        }
        tx.commit()?;
        Ok(())
    }

    fn update_where(
        &self,
        table: &str,
        id: &str,
        guard: &Row,
        changes: &Row,
    ) -> Result<usize, QueryError> {
        let def = table_def(table)?;
        check_columns(def, changes.keys())?;
        check_columns(def, guard.keys())?;
        if changes.is_empty() {
            return Ok(0);
        }

        let mut params = changes
            .iter()
            .map(|(column, value)| to_sql(column, value))
            .collect::<Result<Vec<_>, _>>()?;
        let assignments: Vec<String> = changes
            .keys()
            .enumerate()
            .map(|(i, column)| format!("{} = ?{}", column, i + 1))
            .collect();

        params.push(SqlValue::Text(id.to_string()));
        let mut conditions = vec![format!("id = ?{}", params.len())];
        for (column, value) in guard {
            if value.is_null() {
                conditions.push(format!("{} IS NULL", column));
            } else {
                params.push(to_sql(column, value)?);
                conditions.push(format!("{} = ?{}", column, params.len()));
            }
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            def.name,
            assignments.join(", "),
            conditions.join(" AND ")
        );

        let conn = self.lock()?;
        let changed = conn.execute(&sql, params_from_iter(params.iter()))?;
        Ok(changed)
    }
}

fn insert_sql(def: &TableDef, row: &Row) -> Result<(String, Vec<SqlValue>), QueryError> {
    check_columns(def, row.keys())?;

    let columns: Vec<&str> = row.keys().map(String::as_str).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    let params = row
        .iter()
        .map(|(column, value)| to_sql(column, value))
        .collect::<Result<Vec<_>, _>>()?;

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        def.name,
        columns.join(", "),
        placeholders.join(", ")
    );
    Ok((sql, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Direction, ErrorKind};
    use serde_json::json;
    use tempfile::TempDir;

    fn contract(id: &str, status: &str, created_at: &str, value: i64) -> Row {
        json!({
            "id": id,
            "number": format!("CT-{}", id),
            "title": "Cleaning services",
            "supplier_id": "s-1234567",
            "status": status,
            "value_cents": value,
            "created_at": created_at,
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn seeded() -> SqliteBackend {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend
            .insert("contracts", &contract("c-0000001", "ATIVO", "2024-01-01T00:00:00.000000Z", 1000))
            .unwrap();
        backend
            .insert("contracts", &contract("c-0000002", "ENCERRADO", "2024-02-01T00:00:00.000000Z", 2000))
            .unwrap();
        backend
            .insert("contracts", &contract("c-0000003", "ATIVO", "2024-03-01T00:00:00.000000Z", 3000))
            .unwrap();
        backend
    }

    #[test]
    fn open_creates_schema_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("desk.db");

        {
            let backend = SqliteBackend::open(&path).unwrap();
            backend
                .insert("contracts", &contract("c-0000001", "ATIVO", "2024-01-01T00:00:00.000000Z", 1))
                .unwrap();
        }

        // Reopening keeps the data
        let backend = SqliteBackend::open(&path).unwrap();
        let rows = backend.execute(&Query::table("contracts")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(backend.path(), Some(path.as_path()));
    }

    #[test]
    fn filter_and_order_desc() {
        let backend = seeded();
        let rows = backend
            .execute(
                &Query::table("contracts")
                    .eq("status", "ATIVO")
                    .order("created_at", Direction::Descending),
            )
            .unwrap();

        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["c-0000003", "c-0000001"]);
        assert_eq!(rows[0]["value_cents"], json!(3000));
        assert_eq!(rows[0]["starts_on"], Value::Null);
    }

    #[test]
    fn select_and_limit() {
        let backend = seeded();
        let rows = backend
            .execute(
                &Query::table("contracts")
                    .select("id,status")
                    .order("created_at", Direction::Ascending)
                    .limit(2),
            )
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0]["id"], "c-0000001");
    }

    #[test]
    fn empty_result_is_ok() {
        let backend = seeded();
        let rows = backend
            .execute(&Query::table("contracts").eq("status", "SUSPENSO"))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn unknown_column_is_malformed() {
        let backend = seeded();
        let err = backend
            .execute(&Query::table("contracts").eq("signed_by", "x"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedQuery);

        let mut row = contract("c-0000009", "ATIVO", "2024-01-01T00:00:00.000000Z", 1);
        row.insert("signed_by".into(), json!("x"));
        let err = backend.insert("contracts", &row).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedQuery);
    }

    #[test]
    fn duplicate_id_is_constraint_error() {
        let backend = seeded();
        let err = backend
            .insert("contracts", &contract("c-0000001", "ATIVO", "2024-01-01T00:00:00.000000Z", 1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(err.message().contains("UNIQUE"));
    }

    #[test]
    fn update_changes_rows() {
        let backend = seeded();
        let mut changes = Row::new();
        changes.insert("status".into(), json!("SUSPENSO"));

        assert_eq!(backend.update("contracts", "c-0000001", &changes).unwrap(), 1);

        let rows = backend
            .execute(&Query::table("contracts").eq("status", "SUSPENSO"))
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn failed_batch_rolls_back() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let rows = [
            contract("c-0000001", "ATIVO", "2024-01-01T00:00:00.000000Z", 1),
            contract("c-0000002", "ATIVO", "2024-01-02T00:00:00.000000Z", 2),
            contract("c-0000001", "ATIVO", "2024-01-03T00:00:00.000000Z", 3),
        ];

        let err = backend.insert_many("contracts", &rows).unwrap_err();
        assert_eq!(err.row, Some(2));
        assert!(err.source.message().contains("UNIQUE"));

        let stored = backend.execute(&Query::table("contracts")).unwrap();
        assert!(stored.is_empty());
    }

    #[test]
    fn guarded_update_requires_match() {
        let backend = seeded();
        let mut guard = Row::new();
        guard.insert("status".into(), json!("ATIVO"));
        let mut changes = Row::new();
        changes.insert("status".into(), json!("SUSPENSO"));

        // c-0000002 is ENCERRADO
        assert_eq!(
            backend
                .update_where("contracts", "c-0000002", &guard, &changes)
                .unwrap(),
            0
        );
        assert_eq!(
            backend
                .update_where("contracts", "c-0000001", &guard, &changes)
                .unwrap(),
            1
        );
        assert_eq!(
            backend
                .update_where("contracts", "c-0000001", &guard, &changes)
                .unwrap(),
            0
        );
    }

    #[test]
    fn read_only_database_is_permission_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("desk.db");
        // Rollback journal, so the file can be reopened read-only
        SqliteBackend::with_connection(Connection::open(&path).unwrap(), None).unwrap();

        let conn = Connection::open_with_flags(
            &path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        )
        .unwrap();
        let backend = SqliteBackend::with_connection(conn, Some(path)).unwrap();

        let err = backend
            .insert("contracts", &contract("c-0000001", "ATIVO", "2024-01-01T00:00:00.000000Z", 1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Permission);
    }
}
