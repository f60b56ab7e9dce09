//! Orders placed against a contract and their line items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{EntityId, EntityKind};
use super::money::Cents;
use super::status::OrderStatus;
use super::timestamp;

/// An order issued under a contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractOrder {
    pub id: EntityId,

    pub contract_id: EntityId,

    /// Order number, unique within the contract
    pub number: String,

    pub description: String,

    #[serde(default)]
    pub status: OrderStatus,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl ContractOrder {
    pub fn new(
        contract_id: EntityId,
        number: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let number = number.into();
        let created_at = timestamp::now();
        Self {
            id: EntityId::new(
                EntityKind::Order,
                &format!("{}/{}", contract_id, number),
                created_at,
            ),
            contract_id,
            number,
            description: description.into(),
            status: OrderStatus::Open,
            created_at,
        }
    }
}

/// A line item of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: EntityId,

    pub order_id: EntityId,

    pub description: String,

    pub quantity: i64,

    pub unit_price_cents: Cents,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub fn new(
        order_id: EntityId,
        description: impl Into<String>,
        quantity: i64,
        unit_price_cents: Cents,
    ) -> Self {
        let description = description.into();
        let created_at = timestamp::now();
        Self {
            id: EntityId::new(
                EntityKind::Item,
                &format!("{}/{}", order_id, description),
                created_at,
            ),
            order_id,
            description,
            quantity,
            unit_price_cents,
            created_at,
        }
    }

    pub fn total(&self) -> Cents {
        self.unit_price_cents.times(self.quantity)
    }
}

/// Sums the totals of a set of items
pub fn items_total<'a>(items: impl IntoIterator<Item = &'a Item>) -> Cents {
    items.into_iter().map(Item::total).sum()
}
