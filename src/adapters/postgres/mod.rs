//! Postgres implementations of the repository ports.
//!
//! Statuses are stored as text and parsed on the way out; a value no
//! variant matches surfaces as `RepositoryError::Corrupt`.

use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::ParseEnumError;
use crate::ports::{Repositories, RepositoryError};

mod admin;
mod claims;
mod payments;
mod products;
mod startups;
mod underwriting;

pub use admin::{PostgresAuditLogRepository, PostgresSettingRepository, PostgresUserRepository};
pub use claims::PostgresClaimRepository;
pub use payments::{PostgresSettlementRepository, PostgresTransactionRepository};
pub use products::PostgresProductRepository;
pub use startups::PostgresStartupRepository;
pub use underwriting::{PostgresApplicationRepository, PostgresPolicyRepository};

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            products: Arc::new(PostgresProductRepository::new(pool.clone())),
            startups: Arc::new(PostgresStartupRepository::new(pool.clone())),
            applications: Arc::new(PostgresApplicationRepository::new(pool.clone())),
            policies: Arc::new(PostgresPolicyRepository::new(pool.clone())),
            claims: Arc::new(PostgresClaimRepository::new(pool.clone())),
            transactions: Arc::new(PostgresTransactionRepository::new(pool.clone())),
            settlements: Arc::new(PostgresSettlementRepository::new(pool.clone())),
            settings: Arc::new(PostgresSettingRepository::new(pool.clone())),
            audit_logs: Arc::new(PostgresAuditLogRepository::new(pool)),
        }
    }
}

pub(crate) fn parse_column<T>(value: &str) -> Result<T, RepositoryError>
where
    T: FromStr<Err = ParseEnumError>,
{
    value
        .parse()
        .map_err(|e: ParseEnumError| RepositoryError::Corrupt(e.to_string()))
}

/// Maps a missing row to a `NotFound` naming the entity.
pub(crate) fn or_not_found<T>(
    row: Option<T>,
    entity: &str,
    id: impl std::fmt::Display,
) -> Result<T, RepositoryError> {
    row.ok_or_else(|| RepositoryError::NotFound(format!("{} {}", entity, id)))
}
