//! Claims and the claim status workflow.
//!
//! The workflow is a lookup table keyed by the current status. Every status
//! change goes through [`ClaimStatus::transition`], so the HTTP layer cannot
//! persist a status the table does not offer.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{ParseEnumError, TransitionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    New,
    UnderInvestigation,
    Approved,
    Rejected,
    Disputed,
    Paid,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 6] = [
        ClaimStatus::New,
        ClaimStatus::UnderInvestigation,
        ClaimStatus::Approved,
        ClaimStatus::Rejected,
        ClaimStatus::Disputed,
        ClaimStatus::Paid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ClaimStatus::New => "new",
            ClaimStatus::UnderInvestigation => "under_investigation",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
            ClaimStatus::Disputed => "disputed",
            ClaimStatus::Paid => "paid",
        }
    }

    /// Statuses reachable from `self` in one step.
    pub fn allowed_transitions(self) -> &'static [ClaimStatus] {
        use ClaimStatus::*;
        match self {
            New => &[UnderInvestigation, Rejected],
            UnderInvestigation => &[Approved, Rejected, Disputed],
            Approved => &[Paid, UnderInvestigation],
            Rejected => &[UnderInvestigation, Disputed],
            Disputed => &[UnderInvestigation, Approved, Rejected],
            Paid => &[],
        }
    }

    pub fn can_transition_to(self, next: ClaimStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn transition(self, next: ClaimStatus) -> Result<ClaimStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                entity: "claim",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClaimStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("claim status", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claim {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub startup_id: Uuid,
    pub amount: BigDecimal,
    pub description: String,
    pub status: ClaimStatus,
    pub resolution_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    pub fn new(policy_id: Uuid, startup_id: Uuid, amount: BigDecimal, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            policy_id,
            startup_id,
            amount,
            description,
            status: ClaimStatus::New,
            resolution_note: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the claim to `next`, returning the status it left.
    pub fn apply_status(
        &mut self,
        next: ClaimStatus,
        resolution_note: Option<String>,
    ) -> Result<ClaimStatus, TransitionError> {
        let previous = self.status;
        self.status = previous.transition(next)?;
        if resolution_note.is_some() {
            self.resolution_note = resolution_note;
        }
        self.updated_at = Utc::now();
        Ok(previous)
    }
}
