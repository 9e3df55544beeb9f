//! In-process implementation of every repository port.
//!
//! Used by the test suite and for running the API without a database. All
//! collections live behind one lock so multi-record operations (approval,
//! settlement) are atomic the same way the Postgres transactions are.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    Application, ApplicationStatus, AuditLog, Claim, ClaimStatus, Policy, Product, ProductStatus,
    SettlementStatus, Setting, Settlement, Startup, Transaction, User,
};
use crate::ports::{
    ApplicationFilter, ApplicationRepository, AuditLogRepository, ClaimRepository,
    PolicyRepository, ProductRepository, Repositories, RepositoryError, RepositoryResult,
    SettingRepository, SettlementRepository, StartupRepository, TransactionFilter,
    TransactionRepository, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    products: HashMap<Uuid, Product>,
    startups: HashMap<Uuid, Startup>,
    applications: HashMap<Uuid, Application>,
    policies: HashMap<Uuid, Policy>,
    claims: HashMap<Uuid, Claim>,
    transactions: HashMap<Uuid, Transaction>,
    settlements: HashMap<Uuid, Settlement>,
    settings: HashMap<String, Setting>,
    audit_logs: Vec<AuditLog>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Repositories {
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            products: store.clone(),
            startups: store.clone(),
            applications: store.clone(),
            policies: store.clone(),
            claims: store.clone(),
            transactions: store.clone(),
            settlements: store.clone(),
            settings: store.clone(),
            audit_logs: store,
        }
    }
}

fn not_found(entity: &str, id: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::NotFound(format!("{} {}", entity, id))
}

fn newest_first<T>(mut items: Vec<T>, key: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: &User) -> RepositoryResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(format!(
                "user with email {} already exists",
                user.email
            )));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<User> {
        self.tables
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("user", id))
    }

    async fn list(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<User>> {
        let users = self.tables.read().await.users.values().cloned().collect();
        Ok(page(newest_first(users, |u: &User| u.created_at), limit, offset))
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn insert(&self, product: &Product) -> RepositoryResult<Product> {
        self.tables
            .write()
            .await
            .products
            .insert(product.id, product.clone());
        Ok(product.clone())
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Product> {
        self.tables
            .read()
            .await
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("product", id))
    }

    async fn list(&self, status: Option<ProductStatus>) -> RepositoryResult<Vec<Product>> {
        let products = self
            .tables
            .read()
            .await
            .products
            .values()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();
        Ok(newest_first(products, |p: &Product| p.created_at))
    }

    async fn update(&self, product: &Product) -> RepositoryResult<Product> {
        let mut tables = self.tables.write().await;
        match tables.products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(product.clone())
            }
            None => Err(not_found("product", product.id)),
        }
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        let referenced = tables.applications.values().any(|a| a.product_id == id)
            || tables.transactions.values().any(|t| t.product_id == id);
        if referenced {
            return Err(RepositoryError::Conflict(format!(
                "product {} is referenced by applications or payments",
                id
            )));
        }
        tables
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("product", id))
    }
}

#[async_trait]
impl StartupRepository for InMemoryStore {
    async fn insert(&self, startup: &Startup) -> RepositoryResult<Startup> {
        let mut tables = self.tables.write().await;
        if tables.startups.values().any(|s| s.user_id == startup.user_id) {
            return Err(RepositoryError::Conflict(format!(
                "user {} already has a startup profile",
                startup.user_id
            )));
        }
        tables.startups.insert(startup.id, startup.clone());
        Ok(startup.clone())
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Startup> {
        self.tables
            .read()
            .await
            .startups
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("startup", id))
    }

    async fn find_by_user(&self, user_id: Uuid) -> RepositoryResult<Option<Startup>> {
        Ok(self
            .tables
            .read()
            .await
            .startups
            .values()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn find_by_api_key_hash(&self, hash: &str) -> RepositoryResult<Option<Startup>> {
        Ok(self
            .tables
            .read()
            .await
            .startups
            .values()
            .find(|s| s.api_key_hash.as_deref() == Some(hash))
            .cloned())
    }

    async fn list(&self) -> RepositoryResult<Vec<Startup>> {
        let startups = self.tables.read().await.startups.values().cloned().collect();
        Ok(newest_first(startups, |s: &Startup| s.created_at))
    }

    async fn update(&self, startup: &Startup) -> RepositoryResult<Startup> {
        let mut tables = self.tables.write().await;
        match tables.startups.get_mut(&startup.id) {
            Some(existing) => {
                *existing = startup.clone();
                Ok(startup.clone())
            }
            None => Err(not_found("startup", startup.id)),
        }
    }
}

fn check_application(
    tables: &Tables,
    id: Uuid,
    expected: ApplicationStatus,
) -> RepositoryResult<()> {
    let stored = tables
        .applications
        .get(&id)
        .ok_or_else(|| not_found("application", id))?;
    if stored.status != expected {
        return Err(RepositoryError::Conflict(format!(
            "application {} is now '{}', expected '{}'",
            id, stored.status, expected
        )));
    }
    Ok(())
}

#[async_trait]
impl ApplicationRepository for InMemoryStore {
    async fn insert(&self, application: &Application) -> RepositoryResult<Application> {
        self.tables
            .write()
            .await
            .applications
            .insert(application.id, application.clone());
        Ok(application.clone())
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Application> {
        self.tables
            .read()
            .await
            .applications
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("application", id))
    }

    async fn list(&self, filter: &ApplicationFilter) -> RepositoryResult<Vec<Application>> {
        let applications = self
            .tables
            .read()
            .await
            .applications
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        Ok(newest_first(applications, |a: &Application| a.created_at))
    }

    async fn update(
        &self,
        application: &Application,
        expected: ApplicationStatus,
    ) -> RepositoryResult<Application> {
        let mut tables = self.tables.write().await;
        check_application(&tables, application.id, expected)?;
        tables
            .applications
            .insert(application.id, application.clone());
        Ok(application.clone())
    }

    async fn approve(
        &self,
        application: &Application,
        expected: ApplicationStatus,
        policy: &Policy,
    ) -> RepositoryResult<(Application, Policy)> {
        let mut tables = self.tables.write().await;
        check_application(&tables, application.id, expected)?;
        tables
            .applications
            .insert(application.id, application.clone());
        tables.policies.insert(policy.id, policy.clone());
        Ok((application.clone(), policy.clone()))
    }
}

#[async_trait]
impl PolicyRepository for InMemoryStore {
    async fn get(&self, id: Uuid) -> RepositoryResult<Policy> {
        self.tables
            .read()
            .await
            .policies
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("policy", id))
    }

    async fn list(&self, startup_id: Option<Uuid>) -> RepositoryResult<Vec<Policy>> {
        let policies = self
            .tables
            .read()
            .await
            .policies
            .values()
            .filter(|p| startup_id.map_or(true, |id| p.startup_id == id))
            .cloned()
            .collect();
        Ok(newest_first(policies, |p: &Policy| p.created_at))
    }
}

#[async_trait]
impl ClaimRepository for InMemoryStore {
    async fn insert(&self, claim: &Claim) -> RepositoryResult<Claim> {
        self.tables
            .write()
            .await
            .claims
            .insert(claim.id, claim.clone());
        Ok(claim.clone())
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Claim> {
        self.tables
            .read()
            .await
            .claims
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("claim", id))
    }

    async fn list(&self, startup_id: Option<Uuid>) -> RepositoryResult<Vec<Claim>> {
        let claims = self
            .tables
            .read()
            .await
            .claims
            .values()
            .filter(|c| startup_id.map_or(true, |id| c.startup_id == id))
            .cloned()
            .collect();
        Ok(newest_first(claims, |c: &Claim| c.created_at))
    }

    async fn update(&self, claim: &Claim, expected: ClaimStatus) -> RepositoryResult<Claim> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .claims
            .get_mut(&claim.id)
            .ok_or_else(|| not_found("claim", claim.id))?;
        if stored.status != expected {
            return Err(RepositoryError::Conflict(format!(
                "claim {} is now '{}', expected '{}'",
                claim.id, stored.status, expected
            )));
        }
        *stored = claim.clone();
        Ok(claim.clone())
    }
}

#[async_trait]
impl TransactionRepository for InMemoryStore {
    async fn insert(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
        self.tables
            .write()
            .await
            .transactions
            .insert(tx.id, tx.clone());
        Ok(tx.clone())
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Transaction> {
        self.tables
            .read()
            .await
            .transactions
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("transaction", id))
    }

    async fn list(&self, filter: &TransactionFilter) -> RepositoryResult<Vec<Transaction>> {
        let transactions = self
            .tables
            .read()
            .await
            .transactions
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        Ok(page(
            newest_first(transactions, |t: &Transaction| t.created_at),
            filter.limit.unwrap_or(i64::MAX),
            filter.offset,
        ))
    }
}

#[async_trait]
impl SettlementRepository for InMemoryStore {
    async fn pending_currencies(&self) -> RepositoryResult<Vec<String>> {
        let currencies: BTreeSet<String> = self
            .tables
            .read()
            .await
            .transactions
            .values()
            .filter(|t| t.settlement_status == SettlementStatus::Pending)
            .map(|t| t.currency.clone())
            .collect();
        Ok(currencies.into_iter().collect())
    }

    async fn settle(
        &self,
        currency: &str,
        cutoff: DateTime<Utc>,
    ) -> RepositoryResult<Option<Settlement>> {
        let mut tables = self.tables.write().await;
        let pending: Vec<Transaction> = tables
            .transactions
            .values()
            .filter(|t| {
                t.settlement_status == SettlementStatus::Pending
                    && t.currency == currency
                    && t.created_at <= cutoff
            })
            .cloned()
            .collect();

        let now = Utc::now();
        let Some(settlement) = Settlement::from_transactions(currency, &pending, now)? else {
            return Ok(None);
        };

        for tx in &pending {
            if let Some(stored) = tables.transactions.get_mut(&tx.id) {
                stored.settlement_status = SettlementStatus::Settled;
                stored.settlement_id = Some(settlement.id);
                stored.updated_at = now;
            }
        }
        tables.settlements.insert(settlement.id, settlement.clone());
        Ok(Some(settlement))
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Settlement> {
        self.tables
            .read()
            .await
            .settlements
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("settlement", id))
    }

    async fn list(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<Settlement>> {
        let settlements = self
            .tables
            .read()
            .await
            .settlements
            .values()
            .cloned()
            .collect();
        Ok(page(
            newest_first(settlements, |s: &Settlement| s.created_at),
            limit,
            offset,
        ))
    }
}

#[async_trait]
impl SettingRepository for InMemoryStore {
    async fn list(&self) -> RepositoryResult<Vec<Setting>> {
        let mut settings: Vec<Setting> =
            self.tables.read().await.settings.values().cloned().collect();
        settings.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(settings)
    }

    async fn get(&self, key: &str) -> RepositoryResult<Option<Setting>> {
        Ok(self.tables.read().await.settings.get(key).cloned())
    }

    async fn put(&self, setting: &Setting) -> RepositoryResult<Setting> {
        self.tables
            .write()
            .await
            .settings
            .insert(setting.key.clone(), setting.clone());
        Ok(setting.clone())
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryStore {
    async fn record(&self, entry: &AuditLog) -> RepositoryResult<()> {
        self.tables.write().await.audit_logs.push(entry.clone());
        Ok(())
    }

    async fn list(
        &self,
        entity_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<AuditLog>> {
        let entries = self
            .tables
            .read()
            .await
            .audit_logs
            .iter()
            .filter(|e| entity_id.map_or(true, |id| e.entity_id == id))
            .cloned()
            .collect();
        Ok(page(
            newest_first(entries, |e: &AuditLog| e.timestamp),
            limit,
            offset,
        ))
    }
}
