use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{or_not_found, parse_column};
use crate::domain::Startup;
use crate::ports::{RepositoryResult, StartupRepository};

#[derive(Clone)]
pub struct PostgresStartupRepository {
    pool: PgPool,
}

impl PostgresStartupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StartupRepository for PostgresStartupRepository {
    async fn insert(&self, startup: &Startup) -> RepositoryResult<Startup> {
        let row = sqlx::query_as::<_, StartupRow>(
            r#"
            INSERT INTO startups (
                id, user_id, company_name, industry, website, founder_name, founder_email,
                kyc_status, risk_score, api_key_hash, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(startup.id)
        .bind(startup.user_id)
        .bind(&startup.company_name)
        .bind(&startup.industry)
        .bind(&startup.website)
        .bind(&startup.founder_name)
        .bind(&startup.founder_email)
        .bind(startup.kyc_status.as_str())
        .bind(startup.risk_score)
        .bind(&startup.api_key_hash)
        .bind(startup.created_at)
        .bind(startup.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Startup> {
        let row = sqlx::query_as::<_, StartupRow>("SELECT * FROM startups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        or_not_found(row, "startup", id)?.into_domain()
    }

    async fn find_by_user(&self, user_id: Uuid) -> RepositoryResult<Option<Startup>> {
        sqlx::query_as::<_, StartupRow>("SELECT * FROM startups WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(StartupRow::into_domain)
            .transpose()
    }

    async fn find_by_api_key_hash(&self, hash: &str) -> RepositoryResult<Option<Startup>> {
        sqlx::query_as::<_, StartupRow>("SELECT * FROM startups WHERE api_key_hash = $1")
            .bind(hash)
            .fetch_optional(&self.pool)
            .await?
            .map(StartupRow::into_domain)
            .transpose()
    }

    async fn list(&self) -> RepositoryResult<Vec<Startup>> {
        let rows = sqlx::query_as::<_, StartupRow>("SELECT * FROM startups ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(StartupRow::into_domain).collect()
    }

    async fn update(&self, startup: &Startup) -> RepositoryResult<Startup> {
        let row = sqlx::query_as::<_, StartupRow>(
            r#"
            UPDATE startups
            SET company_name = $2, industry = $3, website = $4, founder_name = $5,
                founder_email = $6, kyc_status = $7, risk_score = $8, api_key_hash = $9,
                updated_at = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(startup.id)
        .bind(&startup.company_name)
        .bind(&startup.industry)
        .bind(&startup.website)
        .bind(&startup.founder_name)
        .bind(&startup.founder_email)
        .bind(startup.kyc_status.as_str())
        .bind(startup.risk_score)
        .bind(&startup.api_key_hash)
        .bind(startup.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        or_not_found(row, "startup", startup.id)?.into_domain()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StartupRow {
    id: Uuid,
    user_id: Uuid,
    company_name: String,
    industry: Option<String>,
    website: Option<String>,
    founder_name: String,
    founder_email: String,
    kyc_status: String,
    risk_score: Option<i32>,
    api_key_hash: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StartupRow {
    fn into_domain(self) -> RepositoryResult<Startup> {
        Ok(Startup {
            id: self.id,
            user_id: self.user_id,
            company_name: self.company_name,
            industry: self.industry,
            website: self.website,
            founder_name: self.founder_name,
            founder_email: self.founder_email,
            kyc_status: parse_column(&self.kyc_status)?,
            risk_score: self.risk_score,
            api_key_hash: self.api_key_hash,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
