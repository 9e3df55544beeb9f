use chrono::Utc;
use std::time::Duration;
use tokio::time;

use crate::domain::Settlement;
use crate::error::AppError;
use crate::ports::Repositories;

pub struct SettlementService {
    repos: Repositories,
}

impl SettlementService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Run settlement for every currency with pending transactions.
    pub async fn run_settlements(&self) -> Result<Vec<Settlement>, AppError> {
        let currencies = self.repos.settlements.pending_currencies().await?;

        let mut results = Vec::new();
        for currency in currencies {
            match self.settle_currency(&currency).await {
                Ok(Some(settlement)) => results.push(settlement),
                Ok(None) => tracing::info!("No transactions to settle for currency {}", currency),
                Err(e) => tracing::error!("Failed to settle currency {}: {:?}", currency, e),
            }
        }

        Ok(results)
    }

    /// Settle pending transactions in one currency, up to now.
    pub async fn settle_currency(&self, currency: &str) -> Result<Option<Settlement>, AppError> {
        let settlement = self.repos.settlements.settle(currency, Utc::now()).await?;

        if let Some(ref s) = settlement {
            tracing::info!(
                "Settled {} transactions for currency {} (ID: {})",
                s.tx_count,
                currency,
                s.id
            );
        }

        Ok(settlement)
    }

    /// Runs settlement every `interval` in the background.
    pub fn start(self, interval: Duration) {
        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.tick().await; // Skip first immediate tick

            loop {
                ticker.tick().await;
                match self.run_settlements().await {
                    Ok(done) => tracing::debug!(settlements = done.len(), "settlement run finished"),
                    Err(e) => tracing::error!("Settlement run failed: {}", e),
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{split_payment, SettlementStatus, Transaction};
    use crate::ports::TransactionFilter;
    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    async fn pay(repos: &Repositories, currency: &str, price: i64) -> Transaction {
        let split = split_payment(&BigDecimal::from(10), &BigDecimal::from(price)).unwrap();
        let tx = Transaction::new(Uuid::new_v4(), Uuid::new_v4(), currency.to_string(), None, split);
        repos.transactions.insert(&tx).await.unwrap()
    }

    #[tokio::test]
    async fn settles_each_currency_once() {
        let repos = Repositories::in_memory();
        pay(&repos, "USD", 100).await;
        pay(&repos, "USD", 300).await;
        pay(&repos, "EUR", 50).await;

        let service = SettlementService::new(repos.clone());
        let mut settled = service.run_settlements().await.unwrap();
        settled.sort_by(|a, b| a.currency.cmp(&b.currency));

        assert_eq!(settled.len(), 2);
        assert_eq!(settled[0].currency, "EUR");
        assert_eq!(settled[1].currency, "USD");
        assert_eq!(settled[1].tx_count, 2);
        assert_eq!(settled[1].total_base_amount, BigDecimal::from(400));
        assert_eq!(settled[1].total_premium_amount, BigDecimal::from(20));

        let all = repos.transactions.list(&TransactionFilter::default()).await.unwrap();
        assert!(all.iter().all(|t| t.settlement_status == SettlementStatus::Settled));

        assert!(service.run_settlements().await.unwrap().is_empty());
    }
}
