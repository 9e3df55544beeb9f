use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{split_payment, PaymentSplit};
use crate::error::AppError;
use crate::handlers::{parse_timestamp, Pagination};
use crate::ports::{ApplicationFilter, TransactionFilter};
use crate::services::analytics::{build_report, DateRange};
use crate::AppState;

/// Either a catalogue product or an ad-hoc base price.
#[derive(Debug, Deserialize)]
pub struct PremiumCalculation {
    pub product_id: Option<Uuid>,
    pub base_price: Option<BigDecimal>,
    pub product_price: BigDecimal,
}

#[derive(Debug, Serialize)]
pub struct PremiumCalculationResult {
    pub base_price: BigDecimal,
    pub product_price: BigDecimal,
    #[serde(flatten)]
    pub split: PaymentSplit,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub entity_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn calculate_premium(
    State(state): State<AppState>,
    Json(payload): Json<PremiumCalculation>,
) -> Result<impl IntoResponse, AppError> {
    let base_price = match (payload.product_id, payload.base_price) {
        (Some(product_id), _) => state.repos.products.get(product_id).await?.base_price,
        (None, Some(base_price)) => base_price,
        (None, None) => {
            return Err(AppError::BadRequest(
                "either product_id or base_price is required".to_string(),
            ))
        }
    };

    let split = split_payment(&base_price, &payload.product_price)?;
    Ok(Json(PremiumCalculationResult {
        base_price,
        product_price: payload.product_price,
        split,
    }))
}

pub async fn analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let range = DateRange::resolve(
        parse_timestamp("from", query.from.as_deref())?,
        parse_timestamp("to", query.to.as_deref())?,
        Utc::now(),
    );
    if range.from >= range.to {
        return Err(AppError::BadRequest("'from' must be before 'to'".to_string()));
    }

    let transactions = state
        .repos
        .transactions
        .list(&TransactionFilter {
            startup_id: None,
            from: Some(range.from),
            to: Some(range.to),
            ..TransactionFilter::default()
        })
        .await?;
    let claims = state.repos.claims.list(None).await?;
    let applications = state
        .repos
        .applications
        .list(&ApplicationFilter::default())
        .await?;

    Ok(Json(build_report(range, &transactions, &claims, &applications)))
}

pub async fn list_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<AuditLogQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = Pagination {
        limit: query.limit,
        offset: query.offset,
    };
    let entries = state
        .repos
        .audit_logs
        .list(query.entity_id, page.limit(), page.offset())
        .await?;
    Ok(Json(entries))
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let users = state
        .repos
        .users
        .list(pagination.limit(), pagination.offset())
        .await?;
    Ok(Json(users))
}
