use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{or_not_found, parse_column};
use crate::domain::{Claim, ClaimStatus};
use crate::ports::{ClaimRepository, RepositoryError, RepositoryResult};

#[derive(Clone)]
pub struct PostgresClaimRepository {
    pool: PgPool,
}

impl PostgresClaimRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClaimRepository for PostgresClaimRepository {
    async fn insert(&self, claim: &Claim) -> RepositoryResult<Claim> {
        let row = sqlx::query_as::<_, ClaimRow>(
            r#"
            INSERT INTO claims (
                id, policy_id, startup_id, amount, description, status,
                resolution_note, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(claim.id)
        .bind(claim.policy_id)
        .bind(claim.startup_id)
        .bind(&claim.amount)
        .bind(&claim.description)
        .bind(claim.status.as_str())
        .bind(&claim.resolution_note)
        .bind(claim.created_at)
        .bind(claim.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Claim> {
        let row = sqlx::query_as::<_, ClaimRow>("SELECT * FROM claims WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        or_not_found(row, "claim", id)?.into_domain()
    }

    async fn list(&self, startup_id: Option<Uuid>) -> RepositoryResult<Vec<Claim>> {
        let rows = sqlx::query_as::<_, ClaimRow>(
            r#"
            SELECT * FROM claims
            WHERE ($1::uuid IS NULL OR startup_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(startup_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ClaimRow::into_domain).collect()
    }

    async fn update(&self, claim: &Claim, expected: ClaimStatus) -> RepositoryResult<Claim> {
        let row = sqlx::query_as::<_, ClaimRow>(
            r#"
            UPDATE claims
            SET status = $2, resolution_note = $3, updated_at = $4
            WHERE id = $1 AND status = $5
            RETURNING *
            "#,
        )
        .bind(claim.id)
        .bind(claim.status.as_str())
        .bind(&claim.resolution_note)
        .bind(claim.updated_at)
        .bind(expected.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return row.into_domain();
        }

        let current: Option<String> = sqlx::query_scalar("SELECT status FROM claims WHERE id = $1")
            .bind(claim.id)
            .fetch_optional(&self.pool)
            .await?;

        Err(match current {
            None => RepositoryError::NotFound(format!("claim {}", claim.id)),
            Some(status) => RepositoryError::Conflict(format!(
                "claim {} is now '{}', expected '{}'",
                claim.id, status, expected
            )),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ClaimRow {
    id: Uuid,
    policy_id: Uuid,
    startup_id: Uuid,
    amount: BigDecimal,
    description: String,
    status: String,
    resolution_note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ClaimRow {
    fn into_domain(self) -> RepositoryResult<Claim> {
        Ok(Claim {
            id: self.id,
            policy_id: self.policy_id,
            startup_id: self.startup_id,
            amount: self.amount,
            description: self.description,
            status: parse_column(&self.status)?,
            resolution_note: self.resolution_note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
