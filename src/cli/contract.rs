//! Contract CLI commands

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Subcommand;

use super::list::{self, truncate, Session};
use super::output::Output;
use crate::domain::{Cents, Contract, ContractStatus, EntityId, EntityKind};
use crate::fetch::lists;
use crate::report::ContractReport;
use crate::storage::Records;

#[derive(Subcommand)]
pub enum ContractCommands {
    /// Register a contract with a supplier
    ///
    /// Example:
    ///   desk contract add s-1234567 CT-2024/001 "Office supplies" --value 15000,00
    Add {
        /// Supplier ID
        supplier: String,

        /// Contract number
        number: String,

        /// Short title
        title: String,

        /// Total contracted value (e.g. 1500.00 or 1500,00)
        #[arg(long, default_value = "0")]
        value: Cents,

        /// First day of validity (YYYY-MM-DD)
        #[arg(long)]
        starts: Option<NaiveDate>,

        /// Last day of validity (YYYY-MM-DD)
        #[arg(long)]
        ends: Option<NaiveDate>,
    },

    /// List contracts, newest first
    List {
        /// Only contracts with this status (ativo, suspenso, encerrado)
        #[arg(long)]
        status: Option<ContractStatus>,
    },

    /// Write a markdown report of a contract, its orders and items
    Report {
        /// Contract ID
        id: String,

        /// Write to this file instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

pub fn run(cmd: ContractCommands, output: &Output) -> Result<()> {
    match cmd {
        ContractCommands::Add {
            supplier,
            number,
            title,
            value,
            starts,
            ends,
        } => add_contract(output, &supplier, &number, &title, value, starts, ends),
        ContractCommands::List { status } => list_contracts(output, status),
        ContractCommands::Report { id, out } => report(output, &id, out),
    }
}

fn add_contract(
    output: &Output,
    supplier: &str,
    number: &str,
    title: &str,
    value: Cents,
    starts: Option<NaiveDate>,
    ends: Option<NaiveDate>,
) -> Result<()> {
    if let (Some(start), Some(end)) = (starts, ends) {
        if end < start {
            anyhow::bail!("Contract cannot end ({}) before it starts ({})", end, start);
        }
    }

    let supplier_id = EntityId::parse_as(supplier, EntityKind::Supplier)?;
    let session = Session::open()?;
    let records = Records::new(session.client);

    let mut contract = Contract::new(number, title, supplier_id);
    contract.value_cents = value;
    contract.starts_on = starts;
    contract.ends_on = ends;
    records.add_contract(&contract)?;

    if output.is_json() {
        output.data(&contract);
    } else {
        output.success(&format!(
            "Created contract: {} - {} {}",
            contract.id, contract.number, contract.title
        ));
    }

    Ok(())
}

fn list_contracts(output: &Output, status: Option<ContractStatus>) -> Result<()> {
    let session = Session::open()?;
    let settings = session.settings();
    let timeout = settings.fetch_timeout();

    let fetcher = lists::contracts(session.client.clone()).with_limit(settings.row_limit());
    let state = list::fetch(&fetcher, status, timeout);
    let today = chrono::Local::now().date_naive();

    list::render(output, "contracts", state, timeout, |contracts| {
        if contracts.is_empty() {
            match status {
                Some(status) => println!("No {} contracts", status),
                None => println!("No contracts"),
            }
            return;
        }

        println!(
            "{:<12} {:<16} {:<10} {:>14} TITLE",
            "ID", "NUMBER", "STATUS", "VALUE"
        );
        println!("{}", "-".repeat(80));
        for contract in contracts {
            let expired = if contract.is_expired(today) {
                " (expired)"
            } else {
                ""
            };
            println!(
                "{:<12} {:<16} {:<10} {:>14} {}{}",
                contract.id,
                truncate(&contract.number, 16),
                contract.status,
                contract.value_cents,
                truncate(&contract.title, 30),
                expired
            );
        }
    })
}

fn report(output: &Output, id: &str, out: Option<PathBuf>) -> Result<()> {
    let contract_id = EntityId::parse_as(id, EntityKind::Contract)?;
    let session = Session::open()?;
    let records = Records::new(session.client);

    let report = ContractReport::load(&records, &contract_id)?;
    let markdown = report.render()?;

    match out {
        Some(path) => {
            fs::write(&path, &markdown)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote report");

            if output.is_json() {
                output.data(&serde_json::json!({
                    "id": contract_id.to_string(),
                    "path": path.display().to_string(),
                    "orders": report.orders.len(),
                    "total_cents": report.grand_total(),
                }));
            } else {
                output.success(&format!(
                    "Wrote report for {} to {}",
                    contract_id,
                    path.display()
                ));
            }
        }
        None => {
            if output.is_json() {
                output.data(&serde_json::json!({
                    "id": contract_id.to_string(),
                    "orders": report.orders.len(),
                    "total_cents": report.grand_total(),
                    "markdown": markdown,
                }));
            } else {
                print!("{}", markdown);
            }
        }
    }

    Ok(())
}
