//! In-memory backend
//!
//! Holds rows in plain vectors and evaluates queries the way the SQLite
//! backend does. Used as a substitute store in tests; failures can be
//! injected per table.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use serde_json::Value;

use super::client::Backend;
use super::error::{BatchError, QueryError};
use super::query::{compare_values, Query, Row};
use super::schema::{self, TableDef};

#[derive(Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    failures: Mutex<HashMap<String, QueryError>>,
    executed: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every query and write on `table` fail with `error`
    pub fn fail_table(&self, table: &str, error: QueryError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(table.to_string(), error);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.clear();
        }
    }

    /// Number of read queries executed so far
    pub fn queries_executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }

    fn injected_failure(&self, table: &str) -> Option<QueryError> {
        self.failures
            .lock()
            .ok()
            .and_then(|failures| failures.get(table).cloned())
    }

    fn poisoned() -> QueryError {
        QueryError::Unknown("memory backend lock poisoned".into())
    }
}

fn matches_filter(row: &Row, column: &str, expected: &Value) -> bool {
    match row.get(column) {
        Some(actual) => actual == expected,
        None => expected.is_null(),
    }
}

impl Backend for MemoryBackend {
    fn execute(&self, query: &Query) -> Result<Vec<Row>, QueryError> {
        self.executed.fetch_add(1, Ordering::SeqCst);
        let def = query.validate()?;

        if let Some(err) = self.injected_failure(def.name) {
            return Err(err);
        }

        let tables = self.tables.read().map_err(|_| Self::poisoned())?;
        let mut rows: Vec<Row> = tables
            .get(def.name)
            .map(|rows| {
                rows.iter()
                    .filter(|row| {
                        query
                            .filters()
                            .iter()
                            .all(|f| matches_filter(row, &f.column, &f.value))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = query.order_by() {
            rows.sort_by(|a, b| {
                let a = a.get(&order.column).unwrap_or(&Value::Null);
                let b = b.get(&order.column).unwrap_or(&Value::Null);
                let ord = compare_values(a, b);
                if order.direction.is_ascending() {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        if let Some(limit) = query.row_limit() {
            rows.truncate(limit);
        }

        let columns = query.output_columns(def);
        Ok(rows
            .into_iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
                    .collect()
            })
            .collect())
    }

    fn insert_many(&self, table: &str, rows: &[Row]) -> Result<(), BatchError> {
        let def = schema::table(table)
            .ok_or_else(|| QueryError::MalformedQuery(format!("unknown table '{}'", table)))?;

        if let Some(err) = self.injected_failure(def.name) {
            return Err(err.into());
        }

        for (index, row) in rows.iter().enumerate() {
            check_row(def, row).map_err(|e| BatchError::at(index, e))?;
        }

        // Everything is checked under the write lock before the first push
        let mut tables = self.tables.write().map_err(|_| Self::poisoned())?;
        let existing = tables.entry(def.name.to_string()).or_default();
        for (index, row) in rows.iter().enumerate() {
            let id = row.get("id");
            let taken = existing.iter().any(|r| r.get("id") == id)
                || rows[..index].iter().any(|r| r.get("id") == id);
            if taken {
                return Err(BatchError::at(
                    index,
                    QueryError::Unknown(format!("UNIQUE constraint failed: {}.id", table)),
                ));
            }
        }
        existing.extend(rows.iter().cloned());
        Ok(())
    }

    fn update_where(
        &self,
        table: &str,
        id: &str,
        guard: &Row,
        changes: &Row,
    ) -> Result<usize, QueryError> {
        let def = schema::table(table)
            .ok_or_else(|| QueryError::MalformedQuery(format!("unknown table '{}'", table)))?;

        if let Some(err) = self.injected_failure(def.name) {
            return Err(err);
        }

        for column in changes.keys().chain(guard.keys()) {
            if def.column(column).is_none() {
                return Err(QueryError::MalformedQuery(format!(
                    "unknown column '{}.{}'",
                    table, column
                )));
            }
        }

        let mut tables = self.tables.write().map_err(|_| Self::poisoned())?;
        let mut changed = 0;
        if let Some(rows) = tables.get_mut(def.name) {
            for row in rows.iter_mut().filter(|row| {
                row.get("id").and_then(Value::as_str) == Some(id)
                    && guard
                        .iter()
                        .all(|(column, expected)| matches_filter(row, column, expected))
            }) {
                for (column, value) in changes {
                    row.insert(column.clone(), value.clone());
                }
                changed += 1;
            }
        }
        Ok(changed)
    }
}

/// Rejects unknown columns and missing required values
fn check_row(def: &TableDef, row: &Row) -> Result<(), QueryError> {
    for column in row.keys() {
        if def.column(column).is_none() {
            return Err(QueryError::MalformedQuery(format!(
                "unknown column '{}.{}'",
                def.name, column
            )));
        }
    }
    for column in def.columns.iter().filter(|c| !c.nullable) {
        if row.get(column.name).map_or(true, Value::is_null) {
            return Err(QueryError::Unknown(format!(
                "NOT NULL constraint failed: {}.{}",
                def.name, column.name
            )));
        }
    }
    Ok(())
}
