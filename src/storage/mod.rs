//! # Storage Layer
//!
//! Project layout, configuration and typed access to the project database.
//!
//! ## Project Structure
//!
//! ```text
//! .desk/
//! ├── config.toml           # Project configuration
//! ├── desk.db               # SQLite database (name configurable)
//! └── .gitignore            # Ignores the database files
//! ```
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a desk project
//! - [`Records`] - Create, look up and review records through a client
//! - [`Config`] - Project and global configuration
//! - [`import_jsonl`] - Bulk-load JSONL rows into a table

mod config;
mod import;
mod project;
mod records;

pub use config::{
    Config, ConfigError, GlobalConfig, LogConfig, LogFormat, OutputFormat, ProjectConfig,
    WatchConfig,
};
pub use import::{import_jsonl, ImportError, ImportSummary};
pub use project::{Project, ProjectError};
pub use records::{to_row, Records};
