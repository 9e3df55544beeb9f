use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::audit::ENTITY_STARTUP;
use crate::domain::{AuditLog, KycStatus};
use crate::error::AppError;
use crate::handlers::Pagination;
use crate::middleware::auth::{generate_api_key, Session};
use crate::services::search::filter_startups;
use crate::services::{record_audit, snapshot};
use crate::validation::validate_risk_score;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StartupListQuery {
    pub search: Option<String>,
    pub kyc_status: Option<KycStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStartup {
    pub kyc_status: Option<KycStatus>,
    pub risk_score: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct IssuedApiKey {
    pub startup_id: Uuid,
    /// Shown once; only its digest is kept.
    pub api_key: String,
}

pub async fn list_startups(
    State(state): State<AppState>,
    Query(query): Query<StartupListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let startups = state.repos.startups.list().await?;
    let filtered = filter_startups(startups, query.search.as_deref(), query.kyc_status);
    let page = Pagination {
        limit: query.limit,
        offset: query.offset,
    };
    Ok(Json(page.apply(filtered)))
}

pub async fn get_startup(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let startup = state.repos.startups.get(id).await?;
    Ok(Json(startup))
}

pub async fn update_startup(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateStartup>,
) -> Result<impl IntoResponse, AppError> {
    let before = state.repos.startups.get(id).await?;
    let mut startup = before.clone();

    if let Some(kyc_status) = patch.kyc_status {
        startup.kyc_status = kyc_status;
    }
    if let Some(score) = patch.risk_score {
        validate_risk_score(score)?;
        startup.risk_score = Some(score);
    }
    startup.updated_at = Utc::now();

    let saved = state.repos.startups.update(&startup).await?;
    record_audit(
        &state.repos,
        AuditLog::update(
            saved.id,
            ENTITY_STARTUP,
            snapshot(&before),
            snapshot(&saved),
            session.sub.to_string(),
        ),
    )
    .await;

    Ok(Json(saved))
}

/// Issues a fresh partner API key, replacing any previous one.
pub async fn issue_api_key(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut startup = state.repos.startups.get(id).await?;
    let rotated = startup.has_api_key();

    let api_key = generate_api_key();
    startup.api_key_hash = Some(state.auth.digest_api_key(&api_key)?);
    startup.updated_at = Utc::now();
    state.repos.startups.update(&startup).await?;

    record_audit(
        &state.repos,
        AuditLog::update(
            startup.id,
            ENTITY_STARTUP,
            serde_json::json!({ "api_key": if rotated { "revoked" } else { "none" } }),
            serde_json::json!({ "api_key": "issued" }),
            session.sub.to_string(),
        ),
    )
    .await;

    tracing::info!(startup_id = %startup.id, rotated, "partner api key issued");
    Ok((
        StatusCode::CREATED,
        Json(IssuedApiKey {
            startup_id: startup.id,
            api_key,
        }),
    ))
}
