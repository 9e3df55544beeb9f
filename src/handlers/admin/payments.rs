//! Transactions, CSV export and settlement runs.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use csv::Writer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Transaction;
use crate::error::AppError;
use crate::handlers::{parse_timestamp, Pagination};
use crate::ports::TransactionFilter;
use crate::services::SettlementService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    pub startup_id: Option<Uuid>,
    /// RFC 3339, inclusive.
    pub from: Option<String>,
    /// RFC 3339, exclusive.
    pub to: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TransactionQuery {
    /// The full filtered set, for export.
    fn filter(&self) -> Result<TransactionFilter, AppError> {
        Ok(TransactionFilter {
            startup_id: self.startup_id,
            from: parse_timestamp("from", self.from.as_deref())?,
            to: parse_timestamp("to", self.to.as_deref())?,
            ..TransactionFilter::default()
        })
    }

    fn page(&self) -> Result<TransactionFilter, AppError> {
        let pagination = Pagination {
            limit: self.limit,
            offset: self.offset,
        };
        Ok(TransactionFilter {
            limit: Some(pagination.limit()),
            offset: pagination.offset(),
            ..self.filter()?
        })
    }
}

/// CSV row; amounts as plain strings so the decimals are written verbatim.
#[derive(Serialize)]
struct TransactionCsvRow {
    id: String,
    startup_id: String,
    product_id: String,
    reference: String,
    currency: String,
    base_amount: String,
    premium_amount: String,
    total_amount: String,
    settlement_status: String,
    settlement_id: String,
    created_at: String,
}

impl From<&Transaction> for TransactionCsvRow {
    fn from(tx: &Transaction) -> Self {
        TransactionCsvRow {
            id: tx.id.to_string(),
            startup_id: tx.startup_id.to_string(),
            product_id: tx.product_id.to_string(),
            reference: tx.reference.clone().unwrap_or_default(),
            currency: tx.currency.clone(),
            base_amount: tx.base_amount.to_string(),
            premium_amount: tx.premium_amount.to_string(),
            total_amount: tx.total_amount.to_string(),
            settlement_status: tx.settlement_status.as_str().to_string(),
            settlement_id: tx.settlement_id.map(|id| id.to_string()).unwrap_or_default(),
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

pub(crate) fn transactions_to_csv(transactions: &[Transaction]) -> Result<Vec<u8>, AppError> {
    let mut writer = Writer::from_writer(Vec::new());
    for tx in transactions {
        writer
            .serialize(TransactionCsvRow::from(tx))
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV flush error: {}", e)))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = state.repos.transactions.list(&query.page()?).await?;
    Ok(Json(transactions))
}

pub async fn export_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = state.repos.transactions.list(&query.filter()?).await?;
    let body = transactions_to_csv(&transactions)?;

    tracing::info!(rows = transactions.len(), "transactions exported");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.csv\"",
            ),
        ],
        body,
    ))
}

pub async fn run_settlements(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let service = SettlementService::new(state.repos.clone());
    let settlements = service.run_settlements().await?;
    Ok(Json(settlements))
}

pub async fn list_settlements(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let settlements = state
        .repos
        .settlements
        .list(pagination.limit(), pagination.offset())
        .await?;
    Ok(Json(settlements))
}

pub async fn get_settlement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let settlement = state.repos.settlements.get(id).await?;
    Ok(Json(settlement))
}
