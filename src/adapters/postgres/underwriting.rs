use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction as SqlxTransaction};
use uuid::Uuid;

use super::{or_not_found, parse_column};
use crate::domain::{Application, ApplicationStatus, Policy};
use crate::ports::{
    ApplicationFilter, ApplicationRepository, PolicyRepository, RepositoryError, RepositoryResult,
};

#[derive(Clone)]
pub struct PostgresApplicationRepository {
    pool: PgPool,
}

impl PostgresApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn compare_and_set(
    executor: &mut SqlxTransaction<'_, Postgres>,
    application: &Application,
    expected: ApplicationStatus,
) -> RepositoryResult<Application> {
    let row = sqlx::query_as::<_, ApplicationRow>(
        r#"
        UPDATE applications
        SET status = $2, risk_score = $3, actual_premium = $4, notes = $5, updated_at = $6
        WHERE id = $1 AND status = $7
        RETURNING *
        "#,
    )
    .bind(application.id)
    .bind(application.status.as_str())
    .bind(application.risk_score)
    .bind(&application.actual_premium)
    .bind(&application.notes)
    .bind(application.updated_at)
    .bind(expected.as_str())
    .fetch_optional(&mut **executor)
    .await?;

    if let Some(row) = row {
        return row.into_domain();
    }

    let current: Option<String> =
        sqlx::query_scalar("SELECT status FROM applications WHERE id = $1")
            .bind(application.id)
            .fetch_optional(&mut **executor)
            .await?;

    Err(match current {
        None => RepositoryError::NotFound(format!("application {}", application.id)),
        Some(status) => RepositoryError::Conflict(format!(
            "application {} is now '{}', expected '{}'",
            application.id, status, expected
        )),
    })
}

#[async_trait]
impl ApplicationRepository for PostgresApplicationRepository {
    async fn insert(&self, application: &Application) -> RepositoryResult<Application> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            INSERT INTO applications (
                id, startup_id, product_id, status, requested_coverage, risk_score,
                recommended_premium, actual_premium, notes, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(application.id)
        .bind(application.startup_id)
        .bind(application.product_id)
        .bind(application.status.as_str())
        .bind(&application.requested_coverage)
        .bind(application.risk_score)
        .bind(&application.recommended_premium)
        .bind(&application.actual_premium)
        .bind(&application.notes)
        .bind(application.created_at)
        .bind(application.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Application> {
        let row = sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        or_not_found(row, "application", id)?.into_domain()
    }

    async fn list(&self, filter: &ApplicationFilter) -> RepositoryResult<Vec<Application>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT * FROM applications
            WHERE ($1::uuid IS NULL OR startup_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.startup_id)
        .bind(filter.status.map(ApplicationStatus::as_str))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ApplicationRow::into_domain).collect()
    }

    async fn update(
        &self,
        application: &Application,
        expected: ApplicationStatus,
    ) -> RepositoryResult<Application> {
        let mut tx = self.pool.begin().await?;
        let updated = compare_and_set(&mut tx, application, expected).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn approve(
        &self,
        application: &Application,
        expected: ApplicationStatus,
        policy: &Policy,
    ) -> RepositoryResult<(Application, Policy)> {
        let mut tx = self.pool.begin().await?;

        let updated = compare_and_set(&mut tx, application, expected).await?;

        let policy_row = sqlx::query_as::<_, PolicyRow>(
            r#"
            INSERT INTO policies (
                id, application_id, startup_id, product_id, coverage_amount, premium,
                valid_from, valid_until, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(policy.id)
        .bind(policy.application_id)
        .bind(policy.startup_id)
        .bind(policy.product_id)
        .bind(&policy.coverage_amount)
        .bind(&policy.premium)
        .bind(policy.valid_from)
        .bind(policy.valid_until)
        .bind(policy.status.as_str())
        .bind(policy.created_at)
        .bind(policy.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((updated, policy_row.into_domain()?))
    }
}

#[derive(Clone)]
pub struct PostgresPolicyRepository {
    pool: PgPool,
}

impl PostgresPolicyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PolicyRepository for PostgresPolicyRepository {
    async fn get(&self, id: Uuid) -> RepositoryResult<Policy> {
        let row = sqlx::query_as::<_, PolicyRow>("SELECT * FROM policies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        or_not_found(row, "policy", id)?.into_domain()
    }

    async fn list(&self, startup_id: Option<Uuid>) -> RepositoryResult<Vec<Policy>> {
        let rows = sqlx::query_as::<_, PolicyRow>(
            r#"
            SELECT * FROM policies
            WHERE ($1::uuid IS NULL OR startup_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(startup_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PolicyRow::into_domain).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ApplicationRow {
    id: Uuid,
    startup_id: Uuid,
    product_id: Uuid,
    status: String,
    requested_coverage: BigDecimal,
    risk_score: Option<i32>,
    recommended_premium: BigDecimal,
    actual_premium: Option<BigDecimal>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ApplicationRow {
    fn into_domain(self) -> RepositoryResult<Application> {
        Ok(Application {
            id: self.id,
            startup_id: self.startup_id,
            product_id: self.product_id,
            status: parse_column(&self.status)?,
            requested_coverage: self.requested_coverage,
            risk_score: self.risk_score,
            recommended_premium: self.recommended_premium,
            actual_premium: self.actual_premium,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PolicyRow {
    id: Uuid,
    application_id: Uuid,
    startup_id: Uuid,
    product_id: Uuid,
    coverage_amount: BigDecimal,
    premium: BigDecimal,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PolicyRow {
    fn into_domain(self) -> RepositoryResult<Policy> {
        Ok(Policy {
            id: self.id,
            application_id: self.application_id,
            startup_id: self.startup_id,
            product_id: self.product_id,
            coverage_amount: self.coverage_amount,
            premium: self.premium,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            status: parse_column(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
