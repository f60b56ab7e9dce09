//! # Fetching
//!
//! Read-side state for list screens: a [`RemoteListFetcher`] issues a
//! filtered query through an injected [`Client`](crate::backend::Client)
//! and exposes the outcome as a [`FetchState`] (`Loading`, `Loaded`,
//! `Failed`) or its `{data, loading, error}` [`FetchView`].
//!
//! ```no_run
//! use std::time::Duration;
//! use contract_desk::backend::{Client, SqliteBackend};
//! use contract_desk::domain::SolicitationStatus;
//! use contract_desk::fetch::{lists, FetchState};
//!
//! # fn main() -> Result<(), contract_desk::backend::QueryError> {
//! let client = Client::new(SqliteBackend::open("desk.db".as_ref())?);
//! let pending = lists::solicitations(client);
//! pending.subscribe(Some(SolicitationStatus::Pending));
//!
//! match pending.wait_settled(Duration::from_secs(5)) {
//!     FetchState::Loading => println!("still loading"),
//!     FetchState::Loaded(rows) => println!("{} pending", rows.len()),
//!     FetchState::Failed(error) => eprintln!("{}", error),
//! }
//! # Ok(())
//! # }
//! ```

mod fetcher;
pub mod lists;
mod state;

pub use fetcher::{ListSpec, RemoteListFetcher};
pub use state::{ErrorInfo, FetchState, FetchView};
