//! Typed reads and writes over a [`Client`]
//!
//! Creating a record checks that the record it points at exists, since the
//! tables carry no foreign keys.

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::backend::{Client, Direction, Row};
use crate::domain::{
    Contract, ContractOrder, EntityId, EntityKind, Item, ReviewError, Solicitation,
    SolicitationStatus, Supplier,
};

/// Converts a record into a row for insertion
pub fn to_row<T: Serialize>(record: &T) -> Result<Row> {
    match serde_json::to_value(record).context("Failed to serialize record")? {
        Value::Object(map) => Ok(map),
        other => bail!("Expected a JSON object, got {}", other),
    }
}

/// Record store for one project database
pub struct Records {
    client: Client,
}

impl Records {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Loads a single record by ID, `None` if it does not exist
    pub fn find<T: DeserializeOwned>(&self, id: &EntityId) -> Result<Option<T>> {
        let table = id.kind().table();
        let mut rows = self
            .client
            .from(table)
            .select("*")
            .eq("id", id.clone())
            .limit(1)
            .execute()
            .with_context(|| format!("Failed to look up {}", id))?;

        match rows.pop() {
            Some(row) => {
                let record = serde_json::from_value(Value::Object(row))
                    .with_context(|| format!("Failed to decode {} {}", id.kind(), id))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Loads a record that must exist
    pub fn get<T: DeserializeOwned>(&self, id: &EntityId) -> Result<T> {
        self.find(id)?
            .ok_or_else(|| anyhow::anyhow!("{} not found: {}", capitalize(id.kind()), id))
    }

    fn require(&self, id: &EntityId, kind: EntityKind) -> Result<()> {
        if id.kind() != kind {
            bail!("Expected a {} ID, got '{}'", kind, id);
        }
        self.find::<Value>(id)?
            .map(|_| ())
            .ok_or_else(|| anyhow::anyhow!("{} not found: {}", capitalize(kind), id))
    }

    fn insert<T: Serialize>(&self, kind: EntityKind, record: &T) -> Result<()> {
        let row = to_row(record)?;
        self.client
            .insert(kind.table(), &row)
            .with_context(|| format!("Failed to save {}", kind))?;
        tracing::debug!(table = kind.table(), "inserted row");
        Ok(())
    }

    pub fn add_supplier(&self, supplier: &Supplier) -> Result<()> {
        self.insert(EntityKind::Supplier, supplier)
    }

    pub fn add_contract(&self, contract: &Contract) -> Result<()> {
        self.require(&contract.supplier_id, EntityKind::Supplier)?;
        self.insert(EntityKind::Contract, contract)
    }

    /// Adds an order; the contract must exist and accept new orders
    pub fn add_order(&self, order: &ContractOrder) -> Result<()> {
        let contract: Contract = self.get(&order.contract_id)?;
        if !contract.status.accepts_orders() {
            bail!(
                "Contract {} is {} and does not accept new orders",
                contract.id,
                contract.status
            );
        }
        self.insert(EntityKind::Order, order)
    }

    pub fn add_item(&self, item: &Item) -> Result<()> {
        self.require(&item.order_id, EntityKind::Order)?;
        self.insert(EntityKind::Item, item)
    }

    pub fn add_solicitation(&self, solicitation: &Solicitation) -> Result<()> {
        if let Some(contract_id) = &solicitation.contract_id {
            self.require(contract_id, EntityKind::Contract)?;
        }
        self.insert(EntityKind::Solicitation, solicitation)
    }

    /// Approves or rejects a pending solicitation
    pub fn review_solicitation(
        &self,
        id: &EntityId,
        decision: SolicitationStatus,
    ) -> Result<Solicitation> {
        let mut solicitation: Solicitation = self.get(id)?;
        solicitation.review(decision)?;

        // Only a row that is still pending may change
        let mut guard = Row::new();
        guard.insert("status".to_string(), SolicitationStatus::Pending.into());
        let mut changes = Row::new();
        changes.insert("status".to_string(), decision.into());
        let updated = self
            .client
            .update_where(
                EntityKind::Solicitation.table(),
                &id.to_string(),
                &guard,
                &changes,
            )
            .with_context(|| format!("Failed to update request {}", id))?;
        if updated == 0 {
            let current: Solicitation = self.get(id)?;
            return Err(ReviewError::AlreadyReviewed {
                id: id.clone(),
                status: current.status,
            }
            .into());
        }

        tracing::info!(id = %id, status = %decision, "reviewed request");
        Ok(solicitation)
    }

    /// Orders of a contract, oldest first
    pub fn orders_for(&self, contract_id: &EntityId) -> Result<Vec<ContractOrder>> {
        self.children(EntityKind::Order, "contract_id", contract_id)
    }

    /// Items of an order, oldest first
    pub fn items_for(&self, order_id: &EntityId) -> Result<Vec<Item>> {
        self.children(EntityKind::Item, "order_id", order_id)
    }

    fn children<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        column: &str,
        parent: &EntityId,
    ) -> Result<Vec<T>> {
        let rows = self
            .client
            .from(kind.table())
            .select("*")
            .eq(column, parent.clone())
            .order("created_at", Direction::Ascending)
            .execute()
            .with_context(|| format!("Failed to load {} rows for {}", kind, parent))?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(Value::Object(row))
                    .with_context(|| format!("Failed to decode {} row", kind))
            })
            .collect()
    }
}

fn capitalize(kind: EntityKind) -> String {
    let name = kind.to_string();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => name,
    }
}
