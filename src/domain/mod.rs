//! Domain entities and workflows.
//! Framework-agnostic: nothing in here knows about HTTP or SQL.

pub mod application;
pub mod audit;
pub mod claim;
pub mod policy;
pub mod premium;
pub mod product;
pub mod setting;
pub mod settlement;
pub mod startup;
pub mod transaction;
pub mod user;

pub use application::{Application, ApplicationStatus};
pub use audit::AuditLog;
pub use claim::{Claim, ClaimStatus};
pub use policy::{Policy, PolicyStatus};
pub use premium::{calculate_premium, split_payment, PaymentSplit};
pub use product::{Product, ProductStatus};
pub use setting::Setting;
pub use settlement::Settlement;
pub use startup::{KycStatus, Startup};
pub use transaction::{SettlementStatus, Transaction};
pub use user::{Role, User};

use thiserror::Error;

/// A status change the workflow table does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity} cannot move from '{from}' to '{to}'")]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: &'static str,
    pub to: &'static str,
}

/// A stored or submitted string that does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
