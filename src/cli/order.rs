//! Contract order CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::list::{self, truncate, Session};
use super::output::Output;
use crate::domain::{ContractOrder, EntityId, EntityKind};
use crate::fetch::lists;
use crate::storage::Records;

#[derive(Subcommand)]
pub enum OrderCommands {
    /// Place an order against an active contract
    ///
    /// Example:
    ///   desk order add c-1234567 OF-001 "First delivery"
    Add {
        /// Contract ID
        contract: String,

        /// Order number
        number: String,

        /// What is being ordered
        description: String,
    },

    /// List orders, newest first
    List {
        /// Only orders of this contract
        #[arg(long)]
        contract: Option<String>,
    },
}

pub fn run(cmd: OrderCommands, output: &Output) -> Result<()> {
    match cmd {
        OrderCommands::Add {
            contract,
            number,
            description,
        } => add_order(output, &contract, &number, &description),
        OrderCommands::List { contract } => list_orders(output, contract.as_deref()),
    }
}

fn add_order(output: &Output, contract: &str, number: &str, description: &str) -> Result<()> {
    let contract_id = EntityId::parse_as(contract, EntityKind::Contract)?;
    let session = Session::open()?;
    let records = Records::new(session.client);

    let order = ContractOrder::new(contract_id, number, description);
    records.add_order(&order)?;

    if output.is_json() {
        output.data(&order);
    } else {
        output.success(&format!(
            "Created order: {} - {} (contract {})",
            order.id, order.number, order.contract_id
        ));
    }

    Ok(())
}

fn list_orders(output: &Output, contract: Option<&str>) -> Result<()> {
    let contract_id = contract
        .map(|c| EntityId::parse_as(c, EntityKind::Contract))
        .transpose()?;

    let session = Session::open()?;
    let settings = session.settings();
    let timeout = settings.fetch_timeout();

    let fetcher = lists::contract_orders(session.client.clone()).with_limit(settings.row_limit());
    let state = list::fetch(&fetcher, contract_id.clone(), timeout);

    list::render(output, "contract_orders", state, timeout, |orders| {
        if orders.is_empty() {
            match &contract_id {
                Some(id) => println!("No orders for contract {}", id),
                None => println!("No orders"),
            }
            return;
        }

        println!(
            "{:<12} {:<12} {:<12} {:<12} DESCRIPTION",
            "ID", "CONTRACT", "NUMBER", "STATUS"
        );
        println!("{}", "-".repeat(80));
        for order in orders {
            println!(
                "{:<12} {:<12} {:<12} {:<12} {}",
                order.id,
                order.contract_id,
                truncate(&order.number, 12),
                order.status,
                truncate(&order.description, 30)
            );
        }
    })
}
