//! Typed list fetchers for each table
//!
//! These are the entry points the commands use: each one wires a
//! [`RemoteListFetcher`] to its table, filter column and row type.

use serde_json::Value;

use super::fetcher::{ListSpec, RemoteListFetcher};
use crate::backend::Client;
use crate::domain::{
    Contract, ContractOrder, ContractStatus, EntityId, Item, Solicitation, SolicitationStatus,
    Supplier,
};

pub const SOLICITATIONS: ListSpec = ListSpec::new("solicitations").filtered_by("status");
pub const CONTRACT_ORDERS: ListSpec = ListSpec::new("contract_orders").filtered_by("contract_id");
pub const CONTRACTS: ListSpec = ListSpec::new("contracts").filtered_by("status");
pub const SUPPLIERS: ListSpec = ListSpec::new("suppliers");
pub const ITEMS: ListSpec = ListSpec::new("items").filtered_by("order_id");

/// Purchase requests, optionally filtered by review status
pub fn solicitations(client: Client) -> RemoteListFetcher<Solicitation, SolicitationStatus> {
    RemoteListFetcher::new(client, SOLICITATIONS)
}

/// Orders, optionally restricted to one contract
pub fn contract_orders(client: Client) -> RemoteListFetcher<ContractOrder, EntityId> {
    RemoteListFetcher::new(client, CONTRACT_ORDERS)
}

/// Contracts, optionally filtered by status
pub fn contracts(client: Client) -> RemoteListFetcher<Contract, ContractStatus> {
    RemoteListFetcher::new(client, CONTRACTS)
}

pub fn suppliers(client: Client) -> RemoteListFetcher<Supplier, Value> {
    RemoteListFetcher::new(client, SUPPLIERS)
}

/// Items, optionally restricted to one order
pub fn items(client: Client) -> RemoteListFetcher<Item, EntityId> {
    RemoteListFetcher::new(client, ITEMS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, MemoryBackend, Row};
    use crate::domain::Cents;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    fn insert<T: serde::Serialize>(backend: &MemoryBackend, table: &str, record: &T) {
        let row: Row = match serde_json::to_value(record).unwrap() {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        backend.insert(table, &row).unwrap();
    }

    #[test]
    fn solicitations_by_status() {
        let backend = MemoryBackend::new();
        let mut approved = Solicitation::new("ana", "Desks");
        approved.review(SolicitationStatus::Approved).unwrap();
        insert(&backend, "solicitations", &Solicitation::new("maria", "Toner"));
        insert(&backend, "solicitations", &approved);
        insert(&backend, "solicitations", &Solicitation::new("joao", "Chairs"));

        let fetcher = solicitations(Client::new(backend));
        fetcher.subscribe(Some(SolicitationStatus::Pending));
        let state = fetcher.wait_settled(WAIT);

        let rows = state.data().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.status == SolicitationStatus::Pending));
    }

    #[test]
    fn orders_for_contract() {
        let backend = MemoryBackend::new();
        let supplier = Supplier::new("ACME");
        let first = Contract::new("CT-1", "Paper", supplier.id.clone());
        let second = Contract::new("CT-2", "Toner", supplier.id.clone());
        insert(&backend, "contract_orders", &ContractOrder::new(first.id.clone(), "OF-1", "Batch 1"));
        insert(&backend, "contract_orders", &ContractOrder::new(first.id.clone(), "OF-2", "Batch 2"));
        insert(&backend, "contract_orders", &ContractOrder::new(second.id.clone(), "OF-1", "Only"));

        let fetcher = contract_orders(Client::new(backend));
        fetcher.subscribe(Some(first.id.clone()));
        let state = fetcher.wait_settled(WAIT);

        let rows = state.data().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|o| o.contract_id == first.id));
    }

    #[test]
    fn items_decode_money() {
        let backend = MemoryBackend::new();
        let order_id: EntityId = "o-1234567".parse().unwrap();
        insert(&backend, "items", &Item::new(order_id.clone(), "Pens", 3, Cents(150)));

        let fetcher = items(Client::new(backend));
        fetcher.subscribe(Some(order_id));
        let state = fetcher.wait_settled(WAIT);

        assert_eq!(state.data().unwrap()[0].total(), Cents(450));
    }

    #[test]
    fn suppliers_unfiltered() {
        let backend = MemoryBackend::new();
        insert(&backend, "suppliers", &Supplier::new("ACME"));
        insert(&backend, "suppliers", &Supplier::new("Globex"));

        let fetcher = suppliers(Client::new(backend));
        fetcher.subscribe(None);
        assert_eq!(fetcher.wait_settled(WAIT).data().unwrap().len(), 2);
    }

    #[test]
    fn contracts_by_status() {
        let backend = MemoryBackend::new();
        let supplier = Supplier::new("ACME");
        let mut closed = Contract::new("CT-9", "Old", supplier.id.clone());
        closed.status = ContractStatus::Closed;
        insert(&backend, "contracts", &Contract::new("CT-1", "New", supplier.id.clone()));
        insert(&backend, "contracts", &closed);

        let fetcher = contracts(Client::new(backend));
        fetcher.subscribe(Some(ContractStatus::Closed));
        let state = fetcher.wait_settled(WAIT);

        let rows = state.data().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].number, "CT-9");
    }
}
