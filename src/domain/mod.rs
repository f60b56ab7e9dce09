//! Domain models for the contract desk
//!
//! Contains the entities and value types without any I/O concerns.

mod id;
mod money;
mod status;
mod contract;
mod order;
mod solicitation;
pub mod timestamp;

pub use id::{EntityId, EntityKind, IdError};
pub use money::{Cents, MoneyError};
pub use status::{ContractStatus, OrderStatus, SolicitationStatus};
pub use contract::{Contract, Supplier};
pub use order::{items_total, ContractOrder, Item};
pub use solicitation::{ReviewError, Solicitation};
