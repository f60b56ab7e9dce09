//! Query failures
//!
//! Every backend maps its native failures onto [`QueryError`]. The fetcher
//! stores them as data instead of propagating them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a failed query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The store could not be reached (unavailable, busy, I/O failure)
    Network,
    /// The store refused the operation
    Permission,
    /// The query itself is invalid (unknown table/column, bad identifier)
    MalformedQuery,
    /// Anything else, including rows that could not be decoded
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::Network => "network",
            ErrorKind::Permission => "permission",
            ErrorKind::MalformedQuery => "malformed_query",
            ErrorKind::Unknown => "unknown",
        };
        f.pad(label)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Backend unavailable: {0}")]
    Network(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("Query failed: {0}")]
    Unknown(String),
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::Network(_) => ErrorKind::Network,
            QueryError::Permission(_) => ErrorKind::Permission,
            QueryError::MalformedQuery(_) => ErrorKind::MalformedQuery,
            QueryError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// The detail message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            QueryError::Network(m)
            | QueryError::Permission(m)
            | QueryError::MalformedQuery(m)
            | QueryError::Unknown(m) => m,
        }
    }
}

/// A batch write that was rolled back
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{source}")]
pub struct BatchError {
    /// Position of the rejected row, when a single row caused the failure
    pub row: Option<usize>,

    #[source]
    pub source: QueryError,
}

impl BatchError {
    pub fn at(row: usize, source: QueryError) -> Self {
        Self {
            row: Some(row),
            source,
        }
    }
}

impl From<QueryError> for BatchError {
    fn from(source: QueryError) -> Self {
        Self { row: None, source }
    }
}

impl From<rusqlite::Error> for BatchError {
    fn from(err: rusqlite::Error) -> Self {
        QueryError::from(err).into()
    }
}

impl From<rusqlite::Error> for QueryError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        let message = err.to_string();
        match &err {
            rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
                ErrorCode::ReadOnly
                | ErrorCode::PermissionDenied
                | ErrorCode::AuthorizationForStatementDenied => QueryError::Permission(message),
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::FileLockingProtocolFailed => QueryError::Network(message),
                // SQLITE_ERROR: generic SQL error, e.g. "no such column"
                ErrorCode::Unknown if is_sql_input_error(&message) => {
                    QueryError::MalformedQuery(message)
                }
                _ => QueryError::Unknown(message),
            },
            rusqlite::Error::SqlInputError { .. }
            | rusqlite::Error::InvalidColumnName(_)
            | rusqlite::Error::InvalidParameterName(_)
            | rusqlite::Error::InvalidParameterCount(_, _)
            | rusqlite::Error::MultipleStatement => QueryError::MalformedQuery(message),
            _ => QueryError::Unknown(message),
        }
    }
}

fn is_sql_input_error(message: &str) -> bool {
    message.contains("no such") || message.contains("syntax error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_messages() {
        let err = QueryError::Permission("table is read-only".into());
        assert_eq!(err.kind(), ErrorKind::Permission);
        assert_eq!(err.message(), "table is read-only");
        assert_eq!(err.to_string(), "Permission denied: table is read-only");
    }

    #[test]
    fn sqlite_syntax_errors_are_malformed() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err: QueryError = conn.execute("SELEC nothing", []).unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::MalformedQuery);

        let err: QueryError = conn
            .execute("SELECT * FROM missing_table", [])
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::MalformedQuery);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::MalformedQuery).unwrap();
        assert_eq!(json, "\"malformed_query\"");
    }
}
