//! Supplier CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::list::{self, truncate, Session};
use super::output::Output;
use crate::domain::Supplier;
use crate::fetch::lists;
use crate::storage::Records;

#[derive(Subcommand)]
pub enum SupplierCommands {
    /// Register a supplier
    ///
    /// Example:
    ///   desk supplier add "ACME Ltda" --tax-id 12.345.678/0001-90
    Add {
        /// Company name
        name: String,

        /// Tax / registration number
        #[arg(long)]
        tax_id: Option<String>,

        /// Contact email
        #[arg(long)]
        email: Option<String>,
    },

    /// List suppliers, newest first
    List,
}

pub fn run(cmd: SupplierCommands, output: &Output) -> Result<()> {
    match cmd {
        SupplierCommands::Add {
            name,
            tax_id,
            email,
        } => add_supplier(output, &name, tax_id, email),
        SupplierCommands::List => list_suppliers(output),
    }
}

fn add_supplier(
    output: &Output,
    name: &str,
    tax_id: Option<String>,
    email: Option<String>,
) -> Result<()> {
    if name.trim().is_empty() {
        anyhow::bail!("Supplier name cannot be empty");
    }

    let session = Session::open()?;
    let records = Records::new(session.client);

    let mut supplier = Supplier::new(name.trim());
    supplier.tax_id = tax_id;
    supplier.email = email;
    records.add_supplier(&supplier)?;

    if output.is_json() {
        output.data(&supplier);
    } else {
        output.success(&format!("Created supplier: {} - {}", supplier.id, supplier.name));
    }

    Ok(())
}

fn list_suppliers(output: &Output) -> Result<()> {
    let session = Session::open()?;
    let settings = session.settings();
    let timeout = settings.fetch_timeout();

    let fetcher = lists::suppliers(session.client.clone()).with_limit(settings.row_limit());
    let state = list::fetch(&fetcher, None, timeout);

    list::render(output, "suppliers", state, timeout, |suppliers| {
        if suppliers.is_empty() {
            println!("No suppliers");
            return;
        }

        println!("{:<12} {:<30} {:<20} EMAIL", "ID", "NAME", "TAX ID");
        println!("{}", "-".repeat(80));
        for supplier in suppliers {
            println!(
                "{:<12} {:<30} {:<20} {}",
                supplier.id,
                truncate(&supplier.name, 30),
                supplier.tax_id.as_deref().unwrap_or("-"),
                supplier.email.as_deref().unwrap_or("-")
            );
        }
    })
}
