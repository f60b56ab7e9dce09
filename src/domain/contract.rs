//! Suppliers and the contracts signed with them

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::id::{EntityId, EntityKind};
use super::money::Cents;
use super::status::ContractStatus;
use super::timestamp;

/// A company that supplies goods or services under contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: EntityId,

    pub name: String,

    /// Company registration / tax number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Supplier {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let created_at = timestamp::now();
        Self {
            id: EntityId::new(EntityKind::Supplier, &name, created_at),
            name,
            tax_id: None,
            email: None,
            created_at,
        }
    }
}

/// A contract with a supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: EntityId,

    /// Contract number as printed on the signed document
    pub number: String,

    pub title: String,

    pub supplier_id: EntityId,

    #[serde(default)]
    pub status: ContractStatus,

    /// Total contracted value
    #[serde(default)]
    pub value_cents: Cents,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_on: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_on: Option<NaiveDate>,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Contract {
    pub fn new(
        number: impl Into<String>,
        title: impl Into<String>,
        supplier_id: EntityId,
    ) -> Self {
        let number = number.into();
        let created_at = timestamp::now();
        Self {
            id: EntityId::new(EntityKind::Contract, &number, created_at),
            number,
            title: title.into(),
            supplier_id,
            status: ContractStatus::Active,
            value_cents: Cents::ZERO,
            starts_on: None,
            ends_on: None,
            created_at,
        }
    }

    /// Returns true if the contract has passed its end date
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.ends_on.is_some_and(|end| end < today)
    }
}
