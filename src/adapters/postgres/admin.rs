//! Users, settings and the audit trail.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use super::{or_not_found, parse_column};
use crate::domain::{AuditLog, Setting, User};
use crate::ports::{AuditLogRepository, RepositoryResult, SettingRepository, UserRepository};

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert(&self, user: &User) -> RepositoryResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (
                id, email, password_hash, role, profile_completed, onboarding_completed,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.profile_completed)
        .bind(user.onboarding_completed)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<User> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        or_not_found(row, "user", id)?.into_domain()
    }

    async fn list(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserRow::into_domain).collect()
    }
}

#[derive(Clone)]
pub struct PostgresSettingRepository {
    pool: PgPool,
}

impl PostgresSettingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingRepository for PostgresSettingRepository {
    async fn list(&self) -> RepositoryResult<Vec<Setting>> {
        let rows = sqlx::query_as::<_, SettingRow>("SELECT * FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(SettingRow::into_domain).collect())
    }

    async fn get(&self, key: &str) -> RepositoryResult<Option<Setting>> {
        let row = sqlx::query_as::<_, SettingRow>("SELECT * FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(SettingRow::into_domain))
    }

    async fn put(&self, setting: &Setting) -> RepositoryResult<Setting> {
        let row = sqlx::query_as::<_, SettingRow>(
            r#"
            INSERT INTO settings (key, value, updated_by, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, updated_by = EXCLUDED.updated_by,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(&setting.key)
        .bind(&setting.value)
        .bind(&setting.updated_by)
        .bind(setting.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_domain())
    }
}

#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn record(&self, entry: &AuditLog) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, entity_id, entity_type, action, old_val, new_val, actor, timestamp
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id)
        .bind(entry.entity_id)
        .bind(&entry.entity_type)
        .bind(&entry.action)
        .bind(&entry.old_value)
        .bind(&entry.new_value)
        .bind(&entry.actor)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(
        &self,
        entity_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<AuditLog>> {
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT * FROM audit_logs
            WHERE ($1::uuid IS NULL OR entity_id = $1)
            ORDER BY timestamp DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(entity_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AuditLogRow::into_domain).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: Option<String>,
    role: String,
    profile_completed: bool,
    onboarding_completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_domain(self) -> RepositoryResult<User> {
        Ok(User {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            role: parse_column(&self.role)?,
            profile_completed: self.profile_completed,
            onboarding_completed: self.onboarding_completed,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SettingRow {
    key: String,
    value: Value,
    updated_by: Option<String>,
    updated_at: DateTime<Utc>,
}

impl SettingRow {
    fn into_domain(self) -> Setting {
        Setting {
            key: self.key,
            value: self.value,
            updated_by: self.updated_by,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuditLogRow {
    id: Uuid,
    entity_id: Uuid,
    entity_type: String,
    action: String,
    old_val: Option<Value>,
    new_val: Option<Value>,
    actor: String,
    timestamp: DateTime<Utc>,
}

impl AuditLogRow {
    fn into_domain(self) -> AuditLog {
        AuditLog {
            id: self.id,
            entity_id: self.entity_id,
            entity_type: self.entity_type,
            action: self.action,
            old_value: self.old_val,
            new_value: self.new_val,
            actor: self.actor,
            timestamp: self.timestamp,
        }
    }
}
