//! Repository ports.
//!
//! Handlers and services only talk to these traits. `adapters::postgres`
//! implements them over sqlx, `adapters::memory` keeps everything in process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::settlement::BatchTooLarge;
use crate::domain::{
    Application, ApplicationStatus, AuditLog, Claim, ClaimStatus, Policy, Product, ProductStatus,
    Setting, Settlement, Startup, Transaction, User,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("record".to_string()),
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505") => {
                RepositoryError::Conflict(db.message().to_string())
            }
            other => RepositoryError::Database(other.to_string()),
        }
    }
}

impl From<BatchTooLarge> for RepositoryError {
    fn from(e: BatchTooLarge) -> Self {
        RepositoryError::Database(e.to_string())
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub startup_id: Option<Uuid>,
    pub status: Option<ApplicationStatus>,
}

impl ApplicationFilter {
    pub fn matches(&self, application: &Application) -> bool {
        self.startup_id.map_or(true, |id| application.startup_id == id)
            && self.status.map_or(true, |s| application.status == s)
    }
}

/// Half-open `[from, to)` window over `created_at`, newest first. `limit: None`
/// returns every match after `offset`.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub startup_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: i64,
}

impl TransactionFilter {
    pub fn for_startup(startup_id: Uuid) -> Self {
        Self {
            startup_id: Some(startup_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.startup_id.map_or(true, |id| tx.startup_id == id)
            && self.from.map_or(true, |from| tx.created_at >= from)
            && self.to.map_or(true, |to| tx.created_at < to)
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: &User) -> RepositoryResult<User>;
    async fn get(&self, id: Uuid) -> RepositoryResult<User>;
    async fn list(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<User>>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert(&self, product: &Product) -> RepositoryResult<Product>;
    async fn get(&self, id: Uuid) -> RepositoryResult<Product>;
    async fn list(&self, status: Option<ProductStatus>) -> RepositoryResult<Vec<Product>>;
    async fn update(&self, product: &Product) -> RepositoryResult<Product>;
    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;
}

#[async_trait]
pub trait StartupRepository: Send + Sync {
    async fn insert(&self, startup: &Startup) -> RepositoryResult<Startup>;
    async fn get(&self, id: Uuid) -> RepositoryResult<Startup>;
    async fn find_by_user(&self, user_id: Uuid) -> RepositoryResult<Option<Startup>>;
    async fn find_by_api_key_hash(&self, hash: &str) -> RepositoryResult<Option<Startup>>;
    async fn list(&self) -> RepositoryResult<Vec<Startup>>;
    async fn update(&self, startup: &Startup) -> RepositoryResult<Startup>;
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn insert(&self, application: &Application) -> RepositoryResult<Application>;
    async fn get(&self, id: Uuid) -> RepositoryResult<Application>;
    async fn list(&self, filter: &ApplicationFilter) -> RepositoryResult<Vec<Application>>;

    /// Writes `application` only if the stored status still equals `expected`.
    async fn update(
        &self,
        application: &Application,
        expected: ApplicationStatus,
    ) -> RepositoryResult<Application>;

    /// Compare-and-set to approved and issue `policy`, atomically.
    async fn approve(
        &self,
        application: &Application,
        expected: ApplicationStatus,
        policy: &Policy,
    ) -> RepositoryResult<(Application, Policy)>;
}

#[async_trait]
pub trait PolicyRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> RepositoryResult<Policy>;
    async fn list(&self, startup_id: Option<Uuid>) -> RepositoryResult<Vec<Policy>>;
}

#[async_trait]
pub trait ClaimRepository: Send + Sync {
    async fn insert(&self, claim: &Claim) -> RepositoryResult<Claim>;
    async fn get(&self, id: Uuid) -> RepositoryResult<Claim>;
    async fn list(&self, startup_id: Option<Uuid>) -> RepositoryResult<Vec<Claim>>;

    /// Writes `claim` only if the stored status still equals `expected`.
    async fn update(&self, claim: &Claim, expected: ClaimStatus) -> RepositoryResult<Claim>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn insert(&self, tx: &Transaction) -> RepositoryResult<Transaction>;
    async fn get(&self, id: Uuid) -> RepositoryResult<Transaction>;
    async fn list(&self, filter: &TransactionFilter) -> RepositoryResult<Vec<Transaction>>;
}

#[async_trait]
pub trait SettlementRepository: Send + Sync {
    /// Currencies that currently have pending transactions.
    async fn pending_currencies(&self) -> RepositoryResult<Vec<String>>;

    /// Settles every pending transaction in `currency` created at or before
    /// `cutoff`. Returns `None` when there was nothing to settle.
    async fn settle(
        &self,
        currency: &str,
        cutoff: DateTime<Utc>,
    ) -> RepositoryResult<Option<Settlement>>;

    async fn get(&self, id: Uuid) -> RepositoryResult<Settlement>;
    async fn list(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<Settlement>>;
}

#[async_trait]
pub trait SettingRepository: Send + Sync {
    async fn list(&self) -> RepositoryResult<Vec<Setting>>;
    async fn get(&self, key: &str) -> RepositoryResult<Option<Setting>>;
    async fn put(&self, setting: &Setting) -> RepositoryResult<Setting>;
}

#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn record(&self, entry: &AuditLog) -> RepositoryResult<()>;
    async fn list(
        &self,
        entity_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<AuditLog>>;
}

/// One handle per collection, shared by every request.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub startups: Arc<dyn StartupRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub policies: Arc<dyn PolicyRepository>,
    pub claims: Arc<dyn ClaimRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
    pub settlements: Arc<dyn SettlementRepository>,
    pub settings: Arc<dyn SettingRepository>,
    pub audit_logs: Arc<dyn AuditLogRepository>,
}
