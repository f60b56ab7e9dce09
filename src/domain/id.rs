//! Record IDs for every table
//!
//! ID Format: `{prefix}-{7-char-hash}`
//! - Suppliers: `s-7f2b4c1`
//! - Contracts: `c-7f2b4c1`
//! - Contract orders: `o-7f2b4c1`
//! - Items: `i-7f2b4c1`
//! - Solicitations (purchase requests): `r-7f2b4c1`
//!
//! Hash is derived from kind + label + creation timestamp, so the same label
//! created at different times produces different IDs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid ID format: expected '{{prefix}}-{{7-char-hash}}', got '{0}'")]
    InvalidFormat(String),

    #[error("Unknown ID prefix '{0}'")]
    UnknownPrefix(String),

    #[error("Expected a {expected} ID, got '{got}'")]
    WrongKind { expected: EntityKind, got: String },
}

/// The kind of record an ID points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Supplier,
    Contract,
    Order,
    Item,
    Solicitation,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Supplier,
        EntityKind::Contract,
        EntityKind::Order,
        EntityKind::Item,
        EntityKind::Solicitation,
    ];

    /// Single-letter prefix used in the textual ID
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityKind::Supplier => "s",
            EntityKind::Contract => "c",
            EntityKind::Order => "o",
            EntityKind::Item => "i",
            EntityKind::Solicitation => "r",
        }
    }

    /// Table holding records of this kind
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Supplier => "suppliers",
            EntityKind::Contract => "contracts",
            EntityKind::Order => "contract_orders",
            EntityKind::Item => "items",
            EntityKind::Solicitation => "solicitations",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.prefix() == prefix)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Supplier => "supplier",
            EntityKind::Contract => "contract",
            EntityKind::Order => "order",
            EntityKind::Item => "item",
            EntityKind::Solicitation => "request",
        };
        f.pad(name)
    }
}

/// Generates a 7-character hash from kind, label and timestamp
fn generate_hash(kind: EntityKind, label: &str, timestamp: DateTime<Utc>) -> String {
    let input = format!(
        "{}:{}{}",
        kind.prefix(),
        label,
        timestamp.timestamp_nanos_opt().unwrap_or(0)
    );
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

/// ID of a stored record, e.g. `c-1a2b3c4`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    kind: EntityKind,
    hash: String,
}

impl EntityId {
    /// Creates a new ID from a label (name, number, description) and timestamp
    pub fn new(kind: EntityKind, label: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            hash: generate_hash(kind, label, timestamp),
        }
    }

    /// Parses an ID and checks that it has the expected kind
    pub fn parse_as(s: &str, expected: EntityKind) -> Result<Self, IdError> {
        let id: EntityId = s.parse()?;
        if id.kind != expected {
            return Err(IdError::WrongKind {
                expected,
                got: s.trim().to_string(),
            });
        }
        Ok(id)
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns the hash portion of the ID
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{}-{}", self.kind.prefix(), self.hash))
    }
}

impl FromStr for EntityId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (prefix, hash) = s
            .split_once('-')
            .ok_or_else(|| IdError::InvalidFormat(s.to_string()))?;

        let kind =
            EntityKind::from_prefix(prefix).ok_or_else(|| IdError::UnknownPrefix(prefix.to_string()))?;

        if hash.len() != 7 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdError::InvalidFormat(s.to_string()));
        }

        Ok(Self {
            kind,
            hash: hash.to_ascii_lowercase(),
        })
    }
}

impl TryFrom<String> for EntityId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_string()
    }
}

impl From<EntityId> for serde_json::Value {
    fn from(id: EntityId) -> Self {
        serde_json::Value::String(id.to_string())
    }
}
