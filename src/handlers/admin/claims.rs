use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::ClaimStatus;
use crate::error::AppError;
use crate::handlers::Pagination;
use crate::middleware::auth::Session;
use crate::services::claims::{update_claim_status, ClaimUpdate};
use crate::services::search::filter_claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ClaimListQuery {
    pub search: Option<String>,
    pub status: Option<ClaimStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_claims(
    State(state): State<AppState>,
    Query(query): Query<ClaimListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let claims = state.repos.claims.list(None).await?;
    let filtered = filter_claims(claims, query.search.as_deref(), query.status);
    let page = Pagination {
        limit: query.limit,
        offset: query.offset,
    };
    Ok(Json(page.apply(filtered)))
}

pub async fn get_claim(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let claim = state.repos.claims.get(id).await?;
    Ok(Json(claim))
}

pub async fn update_claim(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(update): Json<ClaimUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let claim = update_claim_status(&state.repos, id, update, &session.sub.to_string()).await?;
    Ok(Json(claim))
}
