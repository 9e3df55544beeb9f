//! Partner API, mounted under `/api/v1` behind `require_api_key`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::PartnerStartup;
use crate::services::payments::{quote_premium, record_payment, PaymentRequest, PremiumQuoteRequest};
use crate::AppState;

pub async fn premium_quote(
    State(state): State<AppState>,
    Json(request): Json<PremiumQuoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(quote_premium(&state.repos, request).await?))
}

pub async fn create_payment(
    State(state): State<AppState>,
    Extension(PartnerStartup(startup)): Extension<PartnerStartup>,
    Json(request): Json<PaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tx = record_payment(&state.repos, &startup, request).await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Extension(PartnerStartup(startup)): Extension<PartnerStartup>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let tx = state.repos.transactions.get(id).await?;
    if tx.startup_id != startup.id {
        return Err(AppError::NotFound(format!("transaction {}", id)));
    }
    Ok(Json(tx))
}
