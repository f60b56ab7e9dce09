//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project management | `init`, `dashboard`, `import` |
//! | Records | Create and list | `supplier add`, `contract list`, `item add` |
//! | Requests | Purchase request review | `request list`, `request approve` |
//! | Reports | Contract summaries | `contract report c-1234567 --out report.md` |
//! | Live | Auto-refreshing lists | `watch requests --status pendente` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON; lists print `{data, loading, error}`
//!
//! ## Logging
//!
//! Logs go to stderr. Use `-v`, `-vv` or `-vvv` for more detail, or set
//! `RUST_LOG`:
//! ```bash
//! desk -vv request list
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod contract;
mod dashboard;
mod item;
mod list;
pub mod logging;
mod order;
mod output;
mod request;
mod supplier;
mod watch;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
