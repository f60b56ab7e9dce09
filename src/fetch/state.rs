//! Observable state of a list fetch

use serde::Serialize;

use crate::backend::{ErrorKind, QueryError};

/// Snapshot of a failed query, kept in state instead of being propagated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&QueryError> for ErrorInfo {
    fn from(err: &QueryError) -> Self {
        Self::new(err.kind(), err.message())
    }
}

impl From<QueryError> for ErrorInfo {
    fn from(err: QueryError) -> Self {
        Self::from(&err)
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)
    }
}

/// Outcome of the most recent query
///
/// Exactly one variant holds at a time. A failure discards whatever data
/// was loaded before.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Loading,
    Loaded(Vec<T>),
    Failed(ErrorInfo),
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        FetchState::Loading
    }
}

impl<T> FetchState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    /// True once the query has either loaded or failed
    pub fn is_settled(&self) -> bool {
        !self.is_loading()
    }

    pub fn data(&self) -> Option<&[T]> {
        match self {
            FetchState::Loaded(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            FetchState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn into_view(self) -> FetchView<T> {
        FetchView::from(self)
    }
}

/// The `{data, loading, error}` shape handed to the rendering layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchView<T> {
    pub data: Vec<T>,
    pub loading: bool,
    pub error: Option<ErrorInfo>,
}

impl<T> From<FetchState<T>> for FetchView<T> {
    fn from(state: FetchState<T>) -> Self {
        match state {
            FetchState::Loading => Self {
                data: Vec::new(),
                loading: true,
                error: None,
            },
            FetchState::Loaded(data) => Self {
                data,
                loading: false,
                error: None,
            },
            FetchState::Failed(error) => Self {
                data: Vec::new(),
                loading: false,
                error: Some(error),
            },
        }
    }
}
