//! Contract reports
//!
//! A report is a markdown document with YAML frontmatter describing the
//! contract, followed by one section per order listing its items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use anyhow::{Context, Result};

use crate::domain::{
    items_total, timestamp, Cents, Contract, ContractOrder, ContractStatus, EntityId, Item,
    Supplier,
};
use crate::storage::Records;

/// Frontmatter section of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFrontmatter {
    pub id: EntityId,
    pub number: String,
    pub status: ContractStatus,
    pub supplier: String,
    #[serde(with = "timestamp")]
    pub generated_at: DateTime<Utc>,
}

/// An order together with its items
#[derive(Debug, Clone)]
pub struct OrderSection {
    pub order: ContractOrder,
    pub items: Vec<Item>,
}

impl OrderSection {
    pub fn total(&self) -> Cents {
        items_total(&self.items)
    }
}

/// Everything needed to render a contract report
#[derive(Debug, Clone)]
pub struct ContractReport {
    pub contract: Contract,
    pub supplier: Supplier,
    pub orders: Vec<OrderSection>,
    pub generated_at: DateTime<Utc>,
}

impl ContractReport {
    /// Loads the contract, its supplier, orders and items
    pub fn load(records: &Records, contract_id: &EntityId) -> Result<Self> {
        let contract: Contract = records.get(contract_id)?;
        let supplier: Supplier = records
            .get(&contract.supplier_id)
            .with_context(|| format!("Contract {} has no readable supplier", contract.id))?;

        let orders = records
            .orders_for(&contract.id)?
            .into_iter()
            .map(|order| {
                let items = records.items_for(&order.id)?;
                Ok(OrderSection { order, items })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            contract,
            supplier,
            orders,
            generated_at: timestamp::now(),
        })
    }

    /// Sum of all orders that count towards the contract total
    pub fn grand_total(&self) -> Cents {
        self.orders
            .iter()
            .filter(|s| s.order.status.counts_towards_total())
            .map(OrderSection::total)
            .sum()
    }

    pub fn frontmatter(&self) -> ReportFrontmatter {
        ReportFrontmatter {
            id: self.contract.id.clone(),
            number: self.contract.number.clone(),
            status: self.contract.status,
            supplier: self.supplier.name.clone(),
            generated_at: self.generated_at,
        }
    }

    /// Renders the report to markdown
    pub fn render(&self) -> Result<String> {
        let yaml =
            serde_yaml::to_string(&self.frontmatter()).context("Failed to serialize frontmatter")?;

        let mut content = String::new();
        content.push_str("---\n");
        content.push_str(&yaml);
        content.push_str("---\n\n");

        let contract = &self.contract;
        content.push_str(&format!("# Contract {}: {}\n\n", contract.number, contract.title));
        content.push_str(&format!("- Supplier: {}\n", self.supplier.name));
        content.push_str(&format!("- Status: {}\n", contract.status));
        content.push_str(&format!("- Contracted value: {}\n", contract.value_cents));
        if let Some(start) = contract.starts_on {
            content.push_str(&format!("- Starts: {}\n", start));
        }
        if let Some(end) = contract.ends_on {
            content.push_str(&format!("- Ends: {}\n", end));
        }

        content.push_str("\n## Orders\n");
        if self.orders.is_empty() {
            content.push_str("\nNo orders.\n");
        }

        for section in &self.orders {
            let order = &section.order;
            content.push_str(&format!(
                "\n### {} ({})\n\n{}\n\n",
                order.number, order.status, order.description
            ));

            if section.items.is_empty() {
                content.push_str("No items.\n");
            } else {
                content.push_str("| Item | Qty | Unit price | Total |\n");
                content.push_str("|------|----:|-----------:|------:|\n");
                for item in &section.items {
                    content.push_str(&format!(
                        "| {} | {} | {} | {} |\n",
                        item.description,
                        item.quantity,
                        item.unit_price_cents,
                        item.total()
                    ));
                }
            }

            content.push_str(&format!("\nOrder total: {}\n", section.total()));
        }

        content.push_str(&format!("\n**Grand total: {}**\n", self.grand_total()));

        Ok(content)
    }
}

/// Splits a rendered report back into its frontmatter
pub fn parse_frontmatter(content: &str) -> Result<ReportFrontmatter> {
    let content = content.trim();

    let rest = content
        .strip_prefix("---")
        .ok_or_else(|| anyhow::anyhow!("Missing frontmatter (must start with ---)"))?;
    let end_pos = rest
        .find("\n---")
        .ok_or_else(|| anyhow::anyhow!("Missing frontmatter end delimiter (---)"))?;

    serde_yaml::from_str(rest[..end_pos].trim()).context("Failed to parse frontmatter")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Client, MemoryBackend};
    use crate::domain::OrderStatus;

    fn seeded() -> (Records, Contract) {
        let records = Records::new(Client::new(MemoryBackend::new()));
        let supplier = Supplier::new("ACME Ltda");
        records.add_supplier(&supplier).unwrap();

        let mut contract = Contract::new("CT-2024/7", "Office supplies", supplier.id.clone());
        contract.value_cents = Cents(1_000_000);
        records.add_contract(&contract).unwrap();

        let first = ContractOrder::new(contract.id.clone(), "OF-1", "First batch");
        records.add_order(&first).unwrap();
        records
            .add_item(&Item::new(first.id.clone(), "Pens", 10, Cents(150)))
            .unwrap();
        records
            .add_item(&Item::new(first.id.clone(), "Paper", 2, Cents(2300)))
            .unwrap();

        let mut cancelled = ContractOrder::new(contract.id.clone(), "OF-2", "Cancelled batch");
        cancelled.status = OrderStatus::Cancelled;
        records.add_order(&cancelled).unwrap();
        records
            .add_item(&Item::new(cancelled.id.clone(), "Chairs", 4, Cents(50_000)))
            .unwrap();

        (records, contract)
    }

    #[test]
    fn grand_total_skips_cancelled_orders() {
        let (records, contract) = seeded();
        let report = ContractReport::load(&records, &contract.id).unwrap();

        assert_eq!(report.orders.len(), 2);
        assert_eq!(report.grand_total(), Cents(6100));
    }

    #[test]
    fn render_contains_sections() {
        let (records, contract) = seeded();
        let report = ContractReport::load(&records, &contract.id).unwrap();
        let md = report.render().unwrap();

        assert!(md.starts_with("---\n"));
        assert!(md.contains("# Contract CT-2024/7: Office supplies"));
        assert!(md.contains("### OF-1 (ABERTA)"));
        assert!(md.contains("| Pens | 10 | 1.50 | 15.00 |"));
        assert!(md.contains("Order total: 61.00"));
        assert!(md.contains("**Grand total: 61.00**"));
    }

    #[test]
    fn frontmatter_roundtrip() {
        let (records, contract) = seeded();
        let report = ContractReport::load(&records, &contract.id).unwrap();
        let md = report.render().unwrap();

        let fm = parse_frontmatter(&md).unwrap();
        assert_eq!(fm, report.frontmatter());
        assert_eq!(fm.supplier, "ACME Ltda");
        assert_eq!(fm.status, ContractStatus::Active);
    }

    #[test]
    fn contract_without_orders() {
        let records = Records::new(Client::new(MemoryBackend::new()));
        let supplier = Supplier::new("Solo");
        records.add_supplier(&supplier).unwrap();
        let contract = Contract::new("CT-1", "Empty", supplier.id.clone());
        records.add_contract(&contract).unwrap();

        let md = ContractReport::load(&records, &contract.id)
            .unwrap()
            .render()
            .unwrap();
        assert!(md.contains("No orders."));
        assert!(md.contains("**Grand total: 0.00**"));
    }

    #[test]
    fn missing_contract_fails() {
        let records = Records::new(Client::new(MemoryBackend::new()));
        let id: EntityId = "c-0000000".parse().unwrap();

        assert!(ContractReport::load(&records, &id).is_err());
    }
}
