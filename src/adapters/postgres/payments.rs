use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{or_not_found, parse_column};
use crate::domain::{Settlement, SettlementStatus, Transaction};
use crate::ports::{
    RepositoryResult, SettlementRepository, TransactionFilter, TransactionRepository,
};

#[derive(Clone)]
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn insert(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (
                id, startup_id, product_id, reference, currency, base_amount,
                premium_amount, total_amount, settlement_status, settlement_id,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(tx.id)
        .bind(tx.startup_id)
        .bind(tx.product_id)
        .bind(&tx.reference)
        .bind(&tx.currency)
        .bind(&tx.base_amount)
        .bind(&tx.premium_amount)
        .bind(&tx.total_amount)
        .bind(tx.settlement_status.as_str())
        .bind(tx.settlement_id)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        or_not_found(row, "transaction", id)?.into_domain()
    }

    async fn list(&self, filter: &TransactionFilter) -> RepositoryResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT * FROM transactions
            WHERE ($1::uuid IS NULL OR startup_id = $1)
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at < $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.startup_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.limit)
        .bind(filter.offset.max(0))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }
}

#[derive(Clone)]
pub struct PostgresSettlementRepository {
    pool: PgPool,
}

impl PostgresSettlementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettlementRepository for PostgresSettlementRepository {
    async fn pending_currencies(&self) -> RepositoryResult<Vec<String>> {
        let currencies = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT currency FROM transactions WHERE settlement_status = 'pending' ORDER BY currency",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(currencies)
    }

    async fn settle(
        &self,
        currency: &str,
        cutoff: DateTime<Utc>,
    ) -> RepositoryResult<Option<Settlement>> {
        let mut tx = self.pool.begin().await?;

        // SKIP LOCKED lets a concurrent run settle the rows we do not hold.
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT * FROM transactions
            WHERE settlement_status = 'pending'
              AND currency = $1
              AND created_at <= $2
            ORDER BY created_at ASC
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(currency)
        .bind(cutoff)
        .fetch_all(&mut *tx)
        .await?;

        let pending = rows
            .into_iter()
            .map(TransactionRow::into_domain)
            .collect::<RepositoryResult<Vec<_>>>()?;

        let Some(settlement) = Settlement::from_transactions(currency, &pending, Utc::now())? else {
            tx.rollback().await?;
            return Ok(None);
        };

        let saved = sqlx::query_as::<_, SettlementRow>(
            r#"
            INSERT INTO settlements (
                id, currency, total_base_amount, total_premium_amount, tx_count,
                period_start, period_end, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(settlement.id)
        .bind(&settlement.currency)
        .bind(&settlement.total_base_amount)
        .bind(&settlement.total_premium_amount)
        .bind(settlement.tx_count)
        .bind(settlement.period_start)
        .bind(settlement.period_end)
        .bind(&settlement.status)
        .bind(settlement.created_at)
        .bind(settlement.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        let tx_ids: Vec<Uuid> = pending.iter().map(|t| t.id).collect();
        sqlx::query(
            r#"
            UPDATE transactions
            SET settlement_status = $1, settlement_id = $2, updated_at = NOW()
            WHERE id = ANY($3)
            "#,
        )
        .bind(SettlementStatus::Settled.as_str())
        .bind(saved.id)
        .bind(&tx_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(saved.into_domain()))
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Settlement> {
        let row = sqlx::query_as::<_, SettlementRow>("SELECT * FROM settlements WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(or_not_found(row, "settlement", id)?.into_domain())
    }

    async fn list(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<Settlement>> {
        let rows = sqlx::query_as::<_, SettlementRow>(
            "SELECT * FROM settlements ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SettlementRow::into_domain).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    startup_id: Uuid,
    product_id: Uuid,
    reference: Option<String>,
    currency: String,
    base_amount: BigDecimal,
    premium_amount: BigDecimal,
    total_amount: BigDecimal,
    settlement_status: String,
    settlement_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> RepositoryResult<Transaction> {
        Ok(Transaction {
            id: self.id,
            startup_id: self.startup_id,
            product_id: self.product_id,
            reference: self.reference,
            currency: self.currency,
            base_amount: self.base_amount,
            premium_amount: self.premium_amount,
            total_amount: self.total_amount,
            settlement_status: parse_column(&self.settlement_status)?,
            settlement_id: self.settlement_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SettlementRow {
    id: Uuid,
    currency: String,
    total_base_amount: BigDecimal,
    total_premium_amount: BigDecimal,
    tx_count: i32,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SettlementRow {
    fn into_domain(self) -> Settlement {
        Settlement {
            id: self.id,
            currency: self.currency,
            total_base_amount: self.total_base_amount,
            total_premium_amount: self.total_premium_amount,
            tx_count: self.tx_count,
            period_start: self.period_start,
            period_end: self.period_end,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
