//! Startup self-service, mounted under `/api/customer` behind `require_customer`.
//!
//! Every handler is scoped to the startup owned by the session subject.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::Utc;
use serde::Deserialize;

use crate::domain::audit::ENTITY_STARTUP;
use crate::domain::{AuditLog, ProductStatus, Startup};
use crate::error::AppError;
use crate::middleware::auth::Session;
use crate::ports::{ApplicationFilter, TransactionFilter};
use crate::services::claims::{file_claim, NewClaim};
use crate::services::underwriting::{submit_application, NewApplication};
use crate::services::{record_audit, snapshot};
use crate::validation::{
    sanitize_string, validate_email, validate_max_len, validate_required, ValidationError,
    NAME_MAX_LEN,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ProfileInput {
    pub company_name: String,
    pub founder_name: String,
    pub founder_email: String,
    pub industry: Option<String>,
    pub website: Option<String>,
}

struct CleanProfile {
    company_name: String,
    founder_name: String,
    founder_email: String,
    industry: Option<String>,
    website: Option<String>,
}

fn optional_text(field: &'static str, value: Option<String>) -> Result<Option<String>, ValidationError> {
    let value = value.map(|v| sanitize_string(&v)).filter(|v| !v.is_empty());
    if let Some(ref v) = value {
        validate_max_len(field, v, NAME_MAX_LEN)?;
    }
    Ok(value)
}

impl ProfileInput {
    fn clean(self) -> Result<CleanProfile, ValidationError> {
        let company_name = sanitize_string(&self.company_name);
        validate_required("company_name", &company_name)?;
        validate_max_len("company_name", &company_name, NAME_MAX_LEN)?;

        let founder_name = sanitize_string(&self.founder_name);
        validate_required("founder_name", &founder_name)?;
        validate_max_len("founder_name", &founder_name, NAME_MAX_LEN)?;

        let founder_email = self.founder_email.trim().to_lowercase();
        validate_email("founder_email", &founder_email)?;

        Ok(CleanProfile {
            company_name,
            founder_name,
            founder_email,
            industry: optional_text("industry", self.industry)?,
            website: optional_text("website", self.website)?,
        })
    }
}

async fn own_startup(state: &AppState, session: &Session) -> Result<Startup, AppError> {
    state
        .repos
        .startups
        .find_by_user(session.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("startup profile".to_string()))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(own_startup(&state, &session).await?))
}

/// Creates the caller's startup profile on first call, updates it afterwards.
pub async fn put_profile(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(input): Json<ProfileInput>,
) -> Result<impl IntoResponse, AppError> {
    let profile = input.clean()?;
    let actor = session.sub.to_string();

    match state.repos.startups.find_by_user(session.sub).await? {
        Some(before) => {
            let mut startup = before.clone();
            startup.company_name = profile.company_name;
            startup.founder_name = profile.founder_name;
            startup.founder_email = profile.founder_email;
            startup.industry = profile.industry;
            startup.website = profile.website;
            startup.updated_at = Utc::now();

            let saved = state.repos.startups.update(&startup).await?;
            record_audit(
                &state.repos,
                AuditLog::update(saved.id, ENTITY_STARTUP, snapshot(&before), snapshot(&saved), actor),
            )
            .await;
            Ok((StatusCode::OK, Json(saved)))
        }
        None => {
            let mut startup = Startup::new(
                session.sub,
                profile.company_name,
                profile.founder_name,
                profile.founder_email,
            );
            startup.industry = profile.industry;
            startup.website = profile.website;

            let saved = state.repos.startups.insert(&startup).await?;
            record_audit(
                &state.repos,
                AuditLog::creation(saved.id, ENTITY_STARTUP, snapshot(&saved), actor),
            )
            .await;
            tracing::info!(startup_id = %saved.id, user_id = %session.sub, "startup profile created");
            Ok((StatusCode::CREATED, Json(saved)))
        }
    }
}

pub async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let products = state.repos.products.list(Some(ProductStatus::Active)).await?;
    Ok(Json(products))
}

pub async fn list_applications(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    let startup = own_startup(&state, &session).await?;
    let filter = ApplicationFilter {
        startup_id: Some(startup.id),
        status: None,
    };
    Ok(Json(state.repos.applications.list(&filter).await?))
}

pub async fn create_application(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(input): Json<NewApplication>,
) -> Result<impl IntoResponse, AppError> {
    let startup = own_startup(&state, &session).await?;
    let application =
        submit_application(&state.repos, &startup, input, &session.sub.to_string()).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn list_policies(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    let startup = own_startup(&state, &session).await?;
    Ok(Json(state.repos.policies.list(Some(startup.id)).await?))
}

pub async fn list_claims(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    let startup = own_startup(&state, &session).await?;
    Ok(Json(state.repos.claims.list(Some(startup.id)).await?))
}

pub async fn create_claim(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(input): Json<NewClaim>,
) -> Result<impl IntoResponse, AppError> {
    let startup = own_startup(&state, &session).await?;
    let claim = file_claim(&state.repos, &startup, input, &session.sub.to_string()).await?;
    Ok((StatusCode::CREATED, Json(claim)))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    let startup = own_startup(&state, &session).await?;
    let transactions = state
        .repos
        .transactions
        .list(&TransactionFilter::for_startup(startup.id))
        .await?;
    Ok(Json(transactions))
}
