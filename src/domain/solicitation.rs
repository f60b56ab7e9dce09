//! Solicitations: purchase requests awaiting review

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::{EntityId, EntityKind};
use super::status::SolicitationStatus;
use super::timestamp;

#[derive(Debug, Error, PartialEq)]
pub enum ReviewError {
    #[error("Request {id} was already reviewed ({status})")]
    AlreadyReviewed {
        id: EntityId,
        status: SolicitationStatus,
    },
}

/// A purchase request, optionally tied to an existing contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solicitation {
    pub id: EntityId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<EntityId>,

    /// Who asked for it
    pub requester: String,

    pub description: String,

    #[serde(default)]
    pub status: SolicitationStatus,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Solicitation {
    pub fn new(requester: impl Into<String>, description: impl Into<String>) -> Self {
        let requester = requester.into();
        let description = description.into();
        let created_at = timestamp::now();
        Self {
            id: EntityId::new(
                EntityKind::Solicitation,
                &format!("{}/{}", requester, description),
                created_at,
            ),
            contract_id: None,
            requester,
            description,
            status: SolicitationStatus::Pending,
            created_at,
        }
    }

    /// Moves a pending request to its final status
    pub fn review(&mut self, decision: SolicitationStatus) -> Result<(), ReviewError> {
        if !self.status.is_pending() {
            return Err(ReviewError::AlreadyReviewed {
                id: self.id.clone(),
                status: self.status,
            });
        }
        self.status = decision;
        Ok(())
    }
}
