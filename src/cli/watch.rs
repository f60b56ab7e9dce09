//! Live lists: keep a fetcher subscribed and refetch on database changes
//!
//! Watches `.desk/` for writes to the database file or its WAL and refetches
//! after the debounce delay. The `-shm` file is ignored: readers touch it too.

use std::path::Path;
use std::sync::mpsc;

use anyhow::{Context, Result};
use clap::Subcommand;
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::list::{truncate, Session};
use super::output::Output;
use crate::domain::{
    Contract, ContractOrder, ContractStatus, EntityId, EntityKind, Solicitation,
    SolicitationStatus,
};
use crate::fetch::{lists, FetchState, RemoteListFetcher};

#[derive(Subcommand)]
pub enum WatchTarget {
    /// Purchase requests
    Requests {
        /// Only requests with this status
        #[arg(long)]
        status: Option<SolicitationStatus>,
    },

    /// Contracts
    Contracts {
        /// Only contracts with this status
        #[arg(long)]
        status: Option<ContractStatus>,
    },

    /// Contract orders
    Orders {
        /// Only orders of this contract
        #[arg(long)]
        contract: Option<String>,
    },
}

/// One-line rendering of a row in a live list
trait WatchRow {
    fn line(&self) -> String;
}

impl WatchRow for Solicitation {
    fn line(&self) -> String {
        format!(
            "{:<12} {:<10} {:<16} {}",
            self.id,
            self.status,
            truncate(&self.requester, 16),
            truncate(&self.description, 40)
        )
    }
}

impl WatchRow for Contract {
    fn line(&self) -> String {
        format!(
            "{:<12} {:<16} {:<10} {:>14} {}",
            self.id,
            truncate(&self.number, 16),
            self.status,
            self.value_cents,
            truncate(&self.title, 30)
        )
    }
}

impl WatchRow for ContractOrder {
    fn line(&self) -> String {
        format!(
            "{:<12} {:<12} {:<12} {}",
            self.id,
            self.contract_id,
            self.status,
            truncate(&self.description, 40)
        )
    }
}

/// Runs a live list until interrupted, or for `count` snapshots
pub fn run(target: WatchTarget, count: Option<usize>, output: &Output) -> Result<()> {
    let session = Session::open()?;
    let limit = session.settings().row_limit();

    match target {
        WatchTarget::Requests { status } => {
            let fetcher = lists::solicitations(session.client.clone()).with_limit(limit);
            watch_list(&session, output, &fetcher, status, count)
        }
        WatchTarget::Contracts { status } => {
            let fetcher = lists::contracts(session.client.clone()).with_limit(limit);
            watch_list(&session, output, &fetcher, status, count)
        }
        WatchTarget::Orders { contract } => {
            let contract_id = contract
                .map(|c| EntityId::parse_as(&c, EntityKind::Contract))
                .transpose()?;
            let fetcher = lists::contract_orders(session.client.clone()).with_limit(limit);
            watch_list(&session, output, &fetcher, contract_id, count)
        }
    }
}

fn watch_list<T, F>(
    session: &Session,
    output: &Output,
    fetcher: &RemoteListFetcher<T, F>,
    filter: Option<F>,
    count: Option<usize>,
) -> Result<()>
where
    T: WatchRow + Serialize + DeserializeOwned + Clone + Send + 'static,
    F: Into<Value>,
{
    let settings = session.settings();
    let timeout = settings.fetch_timeout();
    let desk_dir = session.project.desk_dir();
    let database = settings.database.clone();
    let table = fetcher.spec().table;

    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(settings.debounce(), tx)
        .context("Failed to start file watcher")?;
    debouncer
        .watcher()
        .watch(&desk_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", desk_dir.display()))?;

    tracing::info!(
        table,
        dir = %desk_dir.display(),
        debounce_ms = settings.watch.debounce_ms,
        "watching for changes"
    );

    fetcher.subscribe(filter);
    print_snapshot(output, table, fetcher.wait_settled(timeout));
    let mut shown = 1;

    while count.map_or(true, |max| shown < max) {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changed = events
                    .iter()
                    .any(|e| is_database_file(&e.path, &database));
                if !changed {
                    continue;
                }

                tracing::debug!(table, events = events.len(), "database changed, refetching");
                fetcher.refetch();
                print_snapshot(output, table, fetcher.wait_settled(timeout));
                shown += 1;
            }
            Ok(Err(error)) => {
                tracing::warn!(error = ?error, "watch error");
            }
            Err(e) => {
                tracing::warn!(error = %e, "watch channel closed");
                break;
            }
        }
    }

    Ok(())
}

/// True for the database file and its write-ahead log
fn is_database_file(path: &Path, database: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            name == database || name.strip_prefix(database) == Some("-wal")
        })
}

fn print_snapshot<T: WatchRow + Serialize>(output: &Output, table: &str, state: FetchState<T>) {
    if output.is_json() {
        output.data(&state.into_view());
        return;
    }

    let now = chrono::Local::now().format("%H:%M:%S");
    match state {
        FetchState::Loading => println!("[{}] {}: still loading...", now, table),
        FetchState::Failed(error) => {
            println!("[{}] {}: failed", now, table);
            output.error(&error.to_string());
        }
        FetchState::Loaded(rows) => {
            println!("[{}] {} ({})", now, table, rows.len());
            for row in &rows {
                println!("  {}", row.line());
            }
        }
    }
    println!();
}
