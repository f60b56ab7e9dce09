//! # Backend Layer
//!
//! Query-builder access to the relational store.
//!
//! ## Pieces
//!
//! | Type | Role |
//! |------|------|
//! | [`Query`] | `table / select / eq / order / limit` query value |
//! | [`Backend`] | Trait every store implements |
//! | [`Client`] | Shared handle injected into fetchers and commands |
//! | [`SqliteBackend`] | The project database (`.desk/desk.db`) |
//! | [`MemoryBackend`] | In-memory store for tests, with failure injection |
//! | [`QueryError`] | Network / Permission / MalformedQuery / Unknown |
//! | [`BatchError`] | A rolled-back batch insert and the row that broke it |
//!
//! ## Example
//!
//! ```no_run
//! use contract_desk::backend::{Client, Direction, SqliteBackend};
//!
//! # fn main() -> Result<(), contract_desk::backend::QueryError> {
//! let client = Client::new(SqliteBackend::open("desk.db".as_ref())?);
//! let pending = client
//!     .from("solicitations")
//!     .select("*")
//!     .eq("status", "PENDENTE")
//!     .order("created_at", Direction::Descending)
//!     .limit(50)
//!     .execute()?;
//! # let _ = pending;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod memory;
mod query;
pub mod schema;
mod sqlite;

pub use client::{Backend, Client, Request};
pub use error::{BatchError, ErrorKind, QueryError};
pub use memory::MemoryBackend;
pub use query::{compare_values, Columns, Direction, Filter, OrderBy, Query, Row};
pub use sqlite::SqliteBackend;
