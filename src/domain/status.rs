//! Status values for contracts, orders and solicitations
//!
//! The stored values are the upper-case codes used by the data store
//! (`ATIVO`, `PENDENTE`, ...). Parsing also accepts English aliases so the
//! CLI reads naturally (`--status pending`).

use serde::{Deserialize, Serialize};

/// Lifecycle of a contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ContractStatus {
    #[default]
    #[serde(rename = "ATIVO")]
    Active,

    #[serde(rename = "SUSPENSO")]
    Suspended,

    #[serde(rename = "ENCERRADO")]
    Closed,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Active => "ATIVO",
            ContractStatus::Suspended => "SUSPENSO",
            ContractStatus::Closed => "ENCERRADO",
        }
    }

    /// Returns all valid status values
    pub fn all() -> &'static [ContractStatus] {
        &[
            ContractStatus::Active,
            ContractStatus::Suspended,
            ContractStatus::Closed,
        ]
    }

    /// Returns true if new orders may be placed against the contract
    pub fn accepts_orders(&self) -> bool {
        matches!(self, ContractStatus::Active)
    }
}

impl std::fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for ContractStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ativo" | "active" => Ok(ContractStatus::Active),
            "suspenso" | "suspended" => Ok(ContractStatus::Suspended),
            "encerrado" | "closed" | "ended" => Ok(ContractStatus::Closed),
            _ => Err(format!("Unknown contract status: {}", s)),
        }
    }
}

/// Lifecycle of an order placed against a contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "ABERTA")]
    Open,

    #[serde(rename = "EM_EXECUCAO")]
    InProgress,

    #[serde(rename = "CONCLUIDA")]
    Completed,

    #[serde(rename = "CANCELADA")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "ABERTA",
            OrderStatus::InProgress => "EM_EXECUCAO",
            OrderStatus::Completed => "CONCLUIDA",
            OrderStatus::Cancelled => "CANCELADA",
        }
    }

    /// Returns all valid status values
    pub fn all() -> &'static [OrderStatus] {
        &[
            OrderStatus::Open,
            OrderStatus::InProgress,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ]
    }

    /// Cancelled orders do not count towards contract totals
    pub fn counts_towards_total(&self) -> bool {
        !matches!(self, OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "aberta" | "open" => Ok(OrderStatus::Open),
            "em_execucao" | "in_progress" => Ok(OrderStatus::InProgress),
            "concluida" | "completed" | "done" => Ok(OrderStatus::Completed),
            "cancelada" | "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Unknown order status: {}", s)),
        }
    }
}

/// Review state of a solicitation (purchase request)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SolicitationStatus {
    #[default]
    #[serde(rename = "PENDENTE")]
    Pending,

    #[serde(rename = "APROVADA")]
    Approved,

    #[serde(rename = "REJEITADA")]
    Rejected,
}

impl SolicitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolicitationStatus::Pending => "PENDENTE",
            SolicitationStatus::Approved => "APROVADA",
            SolicitationStatus::Rejected => "REJEITADA",
        }
    }

    /// Returns all valid status values
    pub fn all() -> &'static [SolicitationStatus] {
        &[
            SolicitationStatus::Pending,
            SolicitationStatus::Approved,
            SolicitationStatus::Rejected,
        ]
    }

    /// Returns true while the request still awaits a decision
    pub fn is_pending(&self) -> bool {
        matches!(self, SolicitationStatus::Pending)
    }
}

impl std::fmt::Display for SolicitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for SolicitationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pendente" | "pending" => Ok(SolicitationStatus::Pending),
            "aprovada" | "approved" => Ok(SolicitationStatus::Approved),
            "rejeitada" | "rejected" => Ok(SolicitationStatus::Rejected),
            _ => Err(format!("Unknown request status: {}", s)),
        }
    }
}

impl From<ContractStatus> for serde_json::Value {
    fn from(status: ContractStatus) -> Self {
        serde_json::Value::String(status.as_str().to_string())
    }
}

impl From<OrderStatus> for serde_json::Value {
    fn from(status: OrderStatus) -> Self {
        serde_json::Value::String(status.as_str().to_string())
    }
}

impl From<SolicitationStatus> for serde_json::Value {
    fn from(status: SolicitationStatus) -> Self {
        serde_json::Value::String(status.as_str().to_string())
    }
}
