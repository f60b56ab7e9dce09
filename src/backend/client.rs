//! The backend seam and the client handle built on it

use std::sync::Arc;

use serde_json::Value;

use super::error::{BatchError, QueryError};
use super::query::{Direction, Query, Row};

/// A relational store that can answer [`Query`] values
///
/// Implementations must be shareable across threads: fetchers run each query
/// on a worker thread.
pub trait Backend: Send + Sync {
    /// Runs a read query
    fn execute(&self, query: &Query) -> Result<Vec<Row>, QueryError>;

    /// Inserts every row or none of them; each row must carry an `id`
    fn insert_many(&self, table: &str, rows: &[Row]) -> Result<(), BatchError>;

    /// Updates the row with the given id if its columns match `guard`,
    /// returning the number of rows changed
    fn update_where(
        &self,
        table: &str,
        id: &str,
        guard: &Row,
        changes: &Row,
    ) -> Result<usize, QueryError>;

    /// Inserts one row
    fn insert(&self, table: &str, row: &Row) -> Result<(), QueryError> {
        self.insert_many(table, std::slice::from_ref(row))
            .map_err(|e| e.source)
    }

    /// Updates the row with the given id unconditionally
    fn update(&self, table: &str, id: &str, changes: &Row) -> Result<usize, QueryError> {
        self.update_where(table, id, &Row::new(), changes)
    }
}

/// Cheap-to-clone handle to a shared backend
#[derive(Clone)]
pub struct Client {
    backend: Arc<dyn Backend>,
}

impl Client {
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn from_shared(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Starts a query on `table` bound to this client
    pub fn from(&self, table: &str) -> Request<'_> {
        Request {
            client: self,
            query: Query::table(table),
        }
    }

    pub fn execute(&self, query: &Query) -> Result<Vec<Row>, QueryError> {
        self.backend.execute(query)
    }

    pub fn insert(&self, table: &str, row: &Row) -> Result<(), QueryError> {
        self.backend.insert(table, row)
    }

    pub fn insert_many(&self, table: &str, rows: &[Row]) -> Result<(), BatchError> {
        self.backend.insert_many(table, rows)
    }

    pub fn update(&self, table: &str, id: &str, changes: &Row) -> Result<usize, QueryError> {
        self.backend.update(table, id, changes)
    }

    pub fn update_where(
        &self,
        table: &str,
        id: &str,
        guard: &Row,
        changes: &Row,
    ) -> Result<usize, QueryError> {
        self.backend.update_where(table, id, guard, changes)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

/// A query under construction that executes against its client
pub struct Request<'a> {
    client: &'a Client,
    query: Query,
}

impl Request<'_> {
    pub fn select(mut self, columns: &str) -> Self {
        self.query = self.query.select(columns);
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query = self.query.eq(column, value);
        self
    }

    pub fn order(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.query = self.query.order(column, direction);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query = self.query.limit(limit);
        self
    }

    pub fn execute(self) -> Result<Vec<Row>, QueryError> {
        self.client.execute(&self.query)
    }

    pub fn into_query(self) -> Query {
        self.query
    }
}
