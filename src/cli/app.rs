//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use super::list::Session;
use super::output::{Output, OutputFormat};
use super::{contract, dashboard, item, logging, order, request, supplier, watch};
use crate::storage::{import_jsonl, Config, LogConfig, Project};

#[derive(Parser)]
#[command(name = "desk")]
#[command(author, version, about = "Contracts, orders and purchase requests from the terminal")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true, env = "DESK_FORMAT")]
    pub format: Option<OutputFormat>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new desk project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Manage suppliers
    #[command(subcommand)]
    Supplier(supplier::SupplierCommands),

    /// Manage contracts
    #[command(subcommand)]
    Contract(contract::ContractCommands),

    /// Manage orders placed against contracts
    #[command(subcommand)]
    Order(order::OrderCommands),

    /// Manage order items
    #[command(subcommand)]
    Item(item::ItemCommands),

    /// Manage purchase requests
    #[command(subcommand)]
    Request(request::RequestCommands),

    /// Show status counts and totals
    Dashboard,

    /// Load rows from a JSONL file (one JSON object per line)
    Import {
        /// Target table (suppliers, contracts, contract_orders, items, solicitations)
        table: String,

        /// JSONL file to read
        file: PathBuf,
    },

    /// Keep a list on screen and refresh it when the database changes
    Watch {
        #[command(subcommand)]
        target: watch::WatchTarget,

        /// Exit after printing this many snapshots
        #[arg(
            long,
            global = true,
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
        )]
        count: Option<usize>,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Logging comes up even when the config is broken, so the error is reported
    let config = Config::load();
    let log_settings = config
        .as_ref()
        .map(|c| c.project.log.clone())
        .unwrap_or_else(|_| LogConfig::default());
    logging::init_logging(cli.verbose, &log_settings)?;
    let config = config?;

    let format = cli
        .format
        .unwrap_or_else(|| config.global.default_format.into());
    let output = Output::new(format);

    tracing::debug!(project = ?config.project_root, "desk starting");

    match cli.command {
        Commands::Init { path } => {
            let project = Project::init(&path)?;
            if output.is_json() {
                output.data(&serde_json::json!({
                    "root": project.root().display().to_string(),
                    "database": project.database_path().display().to_string(),
                }));
            } else {
                output.success(&format!(
                    "Initialized desk project at {}",
                    project.root().display()
                ));
            }
        }

        Commands::Supplier(cmd) => supplier::run(cmd, &output)?,
        Commands::Contract(cmd) => contract::run(cmd, &output)?,
        Commands::Order(cmd) => order::run(cmd, &output)?,
        Commands::Item(cmd) => item::run(cmd, &output)?,
        Commands::Request(cmd) => request::run(cmd, &output)?,

        Commands::Dashboard => dashboard::show(&output)?,

        Commands::Import { table, file } => {
            let session = Session::open()?;
            let summary = import_jsonl(&session.client, &table, &file)?;
            if output.is_json() {
                output.data(&summary);
            } else {
                output.success(&format!(
                    "Imported {} row(s) into {}",
                    summary.rows, summary.table
                ));
            }
        }

        Commands::Watch { target, count } => watch::run(target, count, &output)?,
    }

    tracing::debug!("command completed");
    Ok(())
}
