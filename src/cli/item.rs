//! Order item CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::list::{self, truncate, Session};
use super::output::Output;
use crate::domain::{items_total, Cents, EntityId, EntityKind, Item};
use crate::fetch::lists;
use crate::storage::Records;

#[derive(Subcommand)]
pub enum ItemCommands {
    /// Add a line item to an order
    ///
    /// Example:
    ///   desk item add o-1234567 "A4 paper" --qty 10 --unit-price 23,50
    Add {
        /// Order ID
        order: String,

        /// Item description
        description: String,

        /// Quantity
        #[arg(long, default_value = "1")]
        qty: i64,

        /// Price per unit (e.g. 23.50 or 23,50)
        #[arg(long)]
        unit_price: Cents,
    },

    /// List items, newest first
    List {
        /// Only items of this order
        #[arg(long)]
        order: Option<String>,
    },
}

pub fn run(cmd: ItemCommands, output: &Output) -> Result<()> {
    match cmd {
        ItemCommands::Add {
            order,
            description,
            qty,
            unit_price,
        } => add_item(output, &order, &description, qty, unit_price),
        ItemCommands::List { order } => list_items(output, order.as_deref()),
    }
}

fn add_item(
    output: &Output,
    order: &str,
    description: &str,
    qty: i64,
    unit_price: Cents,
) -> Result<()> {
    if qty <= 0 {
        anyhow::bail!("Quantity must be positive, got {}", qty);
    }

    let order_id = EntityId::parse_as(order, EntityKind::Order)?;
    let session = Session::open()?;
    let records = Records::new(session.client);

    let item = Item::new(order_id, description, qty, unit_price);
    records.add_item(&item)?;

    if output.is_json() {
        output.data(&item);
    } else {
        output.success(&format!(
            "Created item: {} - {} x {} = {}",
            item.id,
            item.quantity,
            item.description,
            item.total()
        ));
    }

    Ok(())
}

fn list_items(output: &Output, order: Option<&str>) -> Result<()> {
    let order_id = order
        .map(|o| EntityId::parse_as(o, EntityKind::Order))
        .transpose()?;

    let session = Session::open()?;
    let settings = session.settings();
    let timeout = settings.fetch_timeout();

    let fetcher = lists::items(session.client.clone()).with_limit(settings.row_limit());
    let state = list::fetch(&fetcher, order_id.clone(), timeout);

    list::render(output, "items", state, timeout, |items| {
        if items.is_empty() {
            match &order_id {
                Some(id) => println!("No items for order {}", id),
                None => println!("No items"),
            }
            return;
        }

        println!(
            "{:<12} {:<12} {:>6} {:>12} {:>12} DESCRIPTION",
            "ID", "ORDER", "QTY", "UNIT", "TOTAL"
        );
        println!("{}", "-".repeat(80));
        for item in items {
            println!(
                "{:<12} {:<12} {:>6} {:>12} {:>12} {}",
                item.id,
                item.order_id,
                item.quantity,
                item.unit_price_cents,
                item.total(),
                truncate(&item.description, 30)
            );
        }

        if order_id.is_some() {
            println!();
            println!("Total: {}", items_total(items));
        }
    })
}
