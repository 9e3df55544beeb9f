use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::ApplicationStatus;
use crate::error::AppError;
use crate::middleware::auth::Session;
use crate::ports::ApplicationFilter;
use crate::services::underwriting::{review_application, ApplicationReview};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ApplicationListQuery {
    pub status: Option<ApplicationStatus>,
    pub startup_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct PolicyListQuery {
    pub startup_id: Option<Uuid>,
}

pub async fn list_applications(
    State(state): State<AppState>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = ApplicationFilter {
        startup_id: query.startup_id,
        status: query.status,
    };
    let applications = state.repos.applications.list(&filter).await?;
    Ok(Json(applications))
}

pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let application = state.repos.applications.get(id).await?;
    Ok(Json(application))
}

/// `PATCH /api/admin/applications/:id`. Approval also returns the issued policy.
pub async fn update_application(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(review): Json<ApplicationReview>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = review_application(&state.repos, id, review, &session.sub.to_string()).await?;
    Ok(Json(outcome))
}

pub async fn list_policies(
    State(state): State<AppState>,
    Query(query): Query<PolicyListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let policies = state.repos.policies.list(query.startup_id).await?;
    Ok(Json(policies))
}

pub async fn get_policy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let policy = state.repos.policies.get(id).await?;
    Ok(Json(policy))
}
