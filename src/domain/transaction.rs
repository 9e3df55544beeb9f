//! Payment transaction domain entity.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{ParseEnumError, PaymentSplit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Pending,
    Settled,
    Failed,
}

impl SettlementStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SettlementStatus::Pending => "pending",
            SettlementStatus::Settled => "settled",
            SettlementStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettlementStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SettlementStatus::Pending),
            "settled" => Ok(SettlementStatus::Settled),
            "failed" => Ok(SettlementStatus::Failed),
            other => Err(ParseEnumError::new("settlement status", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub startup_id: Uuid,
    pub product_id: Uuid,
    pub reference: Option<String>,
    pub currency: String,
    pub base_amount: BigDecimal,
    pub premium_amount: BigDecimal,
    pub total_amount: BigDecimal,
    pub settlement_status: SettlementStatus,
    pub settlement_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        startup_id: Uuid,
        product_id: Uuid,
        currency: String,
        reference: Option<String>,
        split: PaymentSplit,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            startup_id,
            product_id,
            reference,
            currency,
            base_amount: split.base_amount,
            premium_amount: split.premium_amount,
            total_amount: split.total_amount,
            settlement_status: SettlementStatus::Pending,
            settlement_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}
