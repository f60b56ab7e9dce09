//! Query builder
//!
//! Queries are plain values: build one with
//! `Query::table("solicitations").select("*").eq("status", "PENDENTE")`
//! and hand it to a [`Backend`](super::Backend). Validation happens when the
//! query is executed, so building never fails.

use std::cmp::Ordering;

use serde_json::Value;

use super::error::QueryError;
use super::schema::{self, TableDef};

/// A row as returned by a backend: column name to JSON value
pub type Row = serde_json::Map<String, Value>;

/// Which columns a query returns
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Columns {
    #[default]
    All,
    Only(Vec<String>),
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    pub fn is_ascending(&self) -> bool {
        matches!(self, Direction::Ascending)
    }
}

/// Equality filter on a column
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

/// A read query against a single table
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: String,
    columns: Columns,
    filters: Vec<Filter>,
    order: Option<OrderBy>,
    limit: Option<usize>,
}

impl Query {
    /// Starts a query on `table`, selecting every column
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Columns::All,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Selects columns: `"*"` or a comma-separated list such as `"id, status"`
    pub fn select(mut self, columns: &str) -> Self {
        let trimmed = columns.trim();
        self.columns = if trimmed == "*" {
            Columns::All
        } else {
            Columns::Only(trimmed.split(',').map(|c| c.trim().to_string()).collect())
        };
        self
    }

    /// Adds an equality filter; a `null` value matches missing values
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn order(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(OrderBy {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn order_by(&self) -> Option<&OrderBy> {
        self.order.as_ref()
    }

    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Checks identifiers and filter values against the schema
    pub fn validate(&self) -> Result<&'static TableDef, QueryError> {
        if !schema::is_identifier(&self.table) {
            return Err(QueryError::MalformedQuery(format!(
                "invalid table name '{}'",
                self.table
            )));
        }
        let def = schema::table(&self.table).ok_or_else(|| {
            QueryError::MalformedQuery(format!("unknown table '{}'", self.table))
        })?;

        let check_column = |column: &str| -> Result<(), QueryError> {
            if !schema::is_identifier(column) {
                return Err(QueryError::MalformedQuery(format!(
                    "invalid column name '{}'",
                    column
                )));
            }
            if def.column(column).is_none() {
                return Err(QueryError::MalformedQuery(format!(
                    "unknown column '{}.{}'",
                    self.table, column
                )));
            }
            Ok(())
        };

        if let Columns::Only(columns) = &self.columns {
            if columns.is_empty() {
                return Err(QueryError::MalformedQuery("empty column list".into()));
            }
            for column in columns {
                check_column(column)?;
            }
        }

        for filter in &self.filters {
            check_column(&filter.column)?;
            if filter.value.is_array() || filter.value.is_object() {
                return Err(QueryError::MalformedQuery(format!(
                    "filter on '{}' must be a scalar value",
                    filter.column
                )));
            }
        }

        if let Some(order) = &self.order {
            check_column(&order.column)?;
        }

        Ok(def)
    }

    /// Names of the columns this query returns, in output order
    pub fn output_columns(&self, def: &TableDef) -> Vec<String> {
        match &self.columns {
            Columns::All => def.column_names().map(str::to_string).collect(),
            Columns::Only(columns) => columns.clone(),
        }
    }
}

/// Orders JSON scalars: nulls first, then booleans, numbers, strings
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            match (x.as_i64(), y.as_i64()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => x
                    .as_f64()
                    .unwrap_or(0.0)
                    .partial_cmp(&y.as_f64().unwrap_or(0.0))
                    .unwrap_or(Ordering::Equal),
            }
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_collects_parts() {
        let query = Query::table("solicitations")
            .select("id, status")
            .eq("status", "PENDENTE")
            .order("created_at", Direction::Descending)
            .limit(10);

        assert_eq!(query.table_name(), "solicitations");
        assert_eq!(
            query.columns(),
            &Columns::Only(vec!["id".into(), "status".into()])
        );
        assert_eq!(query.filters()[0].value, json!("PENDENTE"));
        assert_eq!(
            query.order_by().unwrap().direction,
            Direction::Descending
        );
        assert_eq!(query.row_limit(), Some(10));
        assert!(query.validate().is_ok());
    }

    #[test]
    fn star_selects_all() {
        let query = Query::table("items").select(" * ");
        assert_eq!(query.columns(), &Columns::All);

        let def = query.validate().unwrap();
        assert_eq!(query.output_columns(def)[0], "id");
    }

    #[test]
    fn unknown_table_is_malformed() {
        let err = Query::table("invoices").validate().unwrap_err();
        assert!(matches!(err, QueryError::MalformedQuery(_)));
    }

    #[test]
    fn injection_attempt_is_malformed() {
        let err = Query::table("contracts")
            .eq("status = 'x' OR 1=1 --", "ATIVO")
            .validate()
            .unwrap_err();
        assert!(matches!(err, QueryError::MalformedQuery(_)));
    }

    #[test]
    fn unknown_column_is_malformed() {
        let err = Query::table("contracts")
            .order("signed_at", Direction::Ascending)
            .validate()
            .unwrap_err();
        assert!(err.message().contains("contracts.signed_at"));
    }

    #[test]
    fn non_scalar_filter_is_malformed() {
        let err = Query::table("contracts")
            .eq("status", json!(["ATIVO", "SUSPENSO"]))
            .validate()
            .unwrap_err();
        assert!(matches!(err, QueryError::MalformedQuery(_)));
    }

    #[test]
    fn value_ordering() {
        assert_eq!(compare_values(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare_values(&Value::Null, &json!("a")), Ordering::Less);
    }
}
