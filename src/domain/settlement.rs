use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::Transaction;

pub const SETTLEMENT_COMPLETED: &str = "completed";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("settlement batch of {0} transactions does not fit tx_count")]
pub struct BatchTooLarge(pub usize);

fn tx_count(len: usize) -> Result<i32, BatchTooLarge> {
    i32::try_from(len).map_err(|_| BatchTooLarge(len))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settlement {
    pub id: Uuid,
    pub currency: String,
    pub total_base_amount: BigDecimal,
    pub total_premium_amount: BigDecimal,
    pub tx_count: i32,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Settlement {
    /// Aggregates `transactions` into a settlement. `None` when there is nothing to settle.
    pub fn from_transactions(
        currency: &str,
        transactions: &[Transaction],
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, BatchTooLarge> {
        if transactions.is_empty() {
            return Ok(None);
        }
        let tx_count = tx_count(transactions.len())?;

        let total_base_amount = transactions
            .iter()
            .map(|t| t.base_amount.clone())
            .fold(BigDecimal::from(0), |acc, x| acc + x);
        let total_premium_amount = transactions
            .iter()
            .map(|t| t.premium_amount.clone())
            .fold(BigDecimal::from(0), |acc, x| acc + x);

        let period_start = transactions.iter().map(|t| t.created_at).min().unwrap_or(now);
        let period_end = transactions.iter().map(|t| t.created_at).max().unwrap_or(now);

        Ok(Some(Self {
            id: Uuid::new_v4(),
            currency: currency.to_string(),
            total_base_amount,
            total_premium_amount,
            tx_count,
            period_start,
            period_end,
            status: SETTLEMENT_COMPLETED.to_string(),
            created_at: now,
            updated_at: now,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::split_payment;
    use chrono::Duration;

    fn payment(price: i64) -> Transaction {
        Transaction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "USD".to_string(),
            None,
            split_payment(&BigDecimal::from(10), &BigDecimal::from(price)).unwrap(),
        )
    }

    #[test]
    fn nothing_to_settle() {
        assert_eq!(Settlement::from_transactions("USD", &[], Utc::now()), Ok(None));
    }

    #[test]
    fn tx_count_must_fit_the_column() {
        assert_eq!(tx_count(2), Ok(2));
        assert_eq!(tx_count(i32::MAX as usize), Ok(i32::MAX));
        assert_eq!(
            tx_count(i32::MAX as usize + 1),
            Err(BatchTooLarge(i32::MAX as usize + 1))
        );
    }

    #[test]
    fn sums_base_and_premium() {
        let mut first = payment(5_000);
        first.created_at = first.created_at - Duration::hours(2);
        let second = payment(15_000);

        let settlement =
            Settlement::from_transactions("USD", &[first.clone(), second.clone()], Utc::now())
                .unwrap()
                .unwrap();

        assert_eq!(settlement.tx_count, 2);
        assert_eq!(settlement.total_base_amount, BigDecimal::from(20_000));
        assert_eq!(settlement.total_premium_amount, BigDecimal::from(30));
        assert_eq!(settlement.period_start, first.created_at);
        assert_eq!(settlement.period_end, second.created_at);
    }
}
