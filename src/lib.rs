//! Contract desk - contracts, orders and purchase requests for a small
//! procurement office
//!
//! Records live in a local SQLite database. Every list screen reads through
//! a [`RemoteListFetcher`](fetch::RemoteListFetcher) that exposes the query
//! outcome as `Loading`, `Loaded` or `Failed` state.

pub mod backend;
pub mod cli;
pub mod domain;
pub mod fetch;
pub mod report;
pub mod storage;

pub use backend::{Client, ErrorKind, QueryError};
pub use fetch::{FetchState, FetchView, RemoteListFetcher};
