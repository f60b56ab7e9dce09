//! Dashboard: status counts and totals across the project

use anyhow::Result;
use serde::Serialize;

use super::list::{self, Session};
use super::output::Output;
use crate::domain::{
    Cents, Contract, ContractOrder, ContractStatus, Item, OrderStatus, Solicitation,
    SolicitationStatus, Supplier,
};
use crate::fetch::lists;

#[derive(Debug, Serialize)]
struct StatusCount {
    status: String,
    count: usize,
}

#[derive(Debug, Serialize)]
struct Dashboard {
    contracts: Vec<StatusCount>,
    orders: Vec<StatusCount>,
    requests: Vec<StatusCount>,
    suppliers: usize,
    items: usize,
    contracted_value_cents: Cents,
}

impl Dashboard {
    fn build(
        contracts: &[Contract],
        orders: &[ContractOrder],
        requests: &[Solicitation],
        suppliers: &[Supplier],
        items: &[Item],
    ) -> Self {
        Self {
            contracts: ContractStatus::all()
                .iter()
                .map(|s| count(s.as_str(), contracts.iter().filter(|c| c.status == *s)))
                .collect(),
            orders: OrderStatus::all()
                .iter()
                .map(|s| count(s.as_str(), orders.iter().filter(|o| o.status == *s)))
                .collect(),
            requests: SolicitationStatus::all()
                .iter()
                .map(|s| count(s.as_str(), requests.iter().filter(|r| r.status == *s)))
                .collect(),
            suppliers: suppliers.len(),
            items: items.len(),
            contracted_value_cents: contracts.iter().map(|c| c.value_cents).sum(),
        }
    }
}

fn count<T>(status: &str, matching: impl Iterator<Item = T>) -> StatusCount {
    StatusCount {
        status: status.to_string(),
        count: matching.count(),
    }
}

/// Shows counts per status and project totals
pub fn show(output: &Output) -> Result<()> {
    let session = Session::open()?;
    let timeout = session.settings().fetch_timeout();
    let client = &session.client;

    // Unlimited: counts must cover every row
    let contracts = lists::contracts(client.clone());
    let orders = lists::contract_orders(client.clone());
    let requests = lists::solicitations(client.clone());
    let suppliers = lists::suppliers(client.clone());
    let items = lists::items(client.clone());

    // All five queries run concurrently
    contracts.subscribe(None);
    orders.subscribe(None);
    requests.subscribe(None);
    suppliers.subscribe(None);
    items.subscribe(None);

    let contracts = list::rows("contracts", contracts.wait_settled(timeout), timeout)?;
    let orders = list::rows("contract_orders", orders.wait_settled(timeout), timeout)?;
    let requests = list::rows("solicitations", requests.wait_settled(timeout), timeout)?;
    let suppliers = list::rows("suppliers", suppliers.wait_settled(timeout), timeout)?;
    let items = list::rows("items", items.wait_settled(timeout), timeout)?;

    let dashboard = Dashboard::build(&contracts, &orders, &requests, &suppliers, &items);

    if output.is_json() {
        output.data(&dashboard);
        return Ok(());
    }

    println!("Dashboard");
    println!("{}", "=".repeat(40));
    print_counts("Contracts", &dashboard.contracts);
    print_counts("Orders", &dashboard.orders);
    print_counts("Requests", &dashboard.requests);
    println!();
    println!("Suppliers: {}", dashboard.suppliers);
    println!("Items: {}", dashboard.items);
    println!("Contracted value: {}", dashboard.contracted_value_cents);

    let pending = dashboard
        .requests
        .iter()
        .find(|c| c.status == SolicitationStatus::Pending.as_str())
        .map_or(0, |c| c.count);
    if pending > 0 {
        println!();
        println!("{} request(s) awaiting review. Run 'desk request list --status pendente'.", pending);
    }

    Ok(())
}

fn print_counts(title: &str, counts: &[StatusCount]) {
    let total: usize = counts.iter().map(|c| c.count).sum();
    println!();
    println!("{} ({}):", title, total);
    for c in counts {
        println!("  {:<12} {}", c.status, c.count);
    }
}
