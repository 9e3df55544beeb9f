//! Application intake and review.

use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{record_audit, snapshot};
use crate::domain::audit::{ENTITY_APPLICATION, ENTITY_POLICY};
use crate::domain::{
    calculate_premium, Application, ApplicationStatus, AuditLog, Policy, ProductStatus, Startup,
};
use crate::error::AppError;
use crate::ports::Repositories;
use crate::validation::{
    sanitize_string, validate_max_len, validate_money, validate_non_negative, validate_risk_score,
    ValidationError, DESCRIPTION_MAX_LEN,
};

#[derive(Debug, Deserialize)]
pub struct NewApplication {
    pub product_id: Uuid,
    pub requested_coverage: BigDecimal,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationReview {
    pub status: ApplicationStatus,
    pub actual_premium: Option<BigDecimal>,
    pub risk_score: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewOutcome {
    pub application: Application,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<Policy>,
}

fn clean_notes(notes: Option<String>) -> Result<Option<String>, ValidationError> {
    let notes = notes.map(|n| sanitize_string(&n)).filter(|n| !n.is_empty());
    if let Some(ref n) = notes {
        validate_max_len("notes", n, DESCRIPTION_MAX_LEN)?;
    }
    Ok(notes)
}

/// Files an application for `startup` against an active product. The
/// recommended premium is priced from the requested coverage.
pub async fn submit_application(
    repos: &Repositories,
    startup: &Startup,
    input: NewApplication,
    actor: &str,
) -> Result<Application, AppError> {
    let product = repos.products.get(input.product_id).await?;
    if product.status != ProductStatus::Active {
        return Err(ValidationError::new("product_id", "product is not open for applications").into());
    }

    validate_money("requested_coverage", &input.requested_coverage)?;
    validate_non_negative("requested_coverage", &input.requested_coverage)?;
    if !product.covers(&input.requested_coverage) {
        return Err(ValidationError::new(
            "requested_coverage",
            format!(
                "must be between {} and {}",
                product.coverage_min, product.coverage_max
            ),
        )
        .into());
    }

    let recommended = calculate_premium(&product.base_price, &input.requested_coverage)?;
    let mut application = Application::new(
        startup.id,
        product.id,
        input.requested_coverage,
        recommended,
        startup.risk_score,
    );
    application.notes = clean_notes(input.notes)?;

    let saved = repos.applications.insert(&application).await?;
    record_audit(
        repos,
        AuditLog::creation(saved.id, ENTITY_APPLICATION, snapshot(&saved), actor),
    )
    .await;

    tracing::info!(application_id = %saved.id, startup_id = %startup.id, "application submitted");
    Ok(saved)
}

/// Moves an application through underwriting. Approval issues the policy in
/// the same write as the status change.
pub async fn review_application(
    repos: &Repositories,
    id: Uuid,
    review: ApplicationReview,
    actor: &str,
) -> Result<ReviewOutcome, AppError> {
    let mut application = repos.applications.get(id).await?;

    if let Some(ref premium) = review.actual_premium {
        validate_money("actual_premium", premium)?;
        validate_non_negative("actual_premium", premium)?;
    }
    if let Some(score) = review.risk_score {
        validate_risk_score(score)?;
    }

    let expected = application.apply_status(review.status)?;
    if review.actual_premium.is_some() {
        application.actual_premium = review.actual_premium;
    }
    if review.risk_score.is_some() {
        application.risk_score = review.risk_score;
    }
    if let Some(notes) = clean_notes(review.notes)? {
        application.notes = Some(notes);
    }

    let (application, policy) = if application.status == ApplicationStatus::Approved {
        let policy = Policy::from_application(&application, Utc::now());
        let (application, policy) = repos
            .applications
            .approve(&application, expected, &policy)
            .await?;
        (application, Some(policy))
    } else {
        (repos.applications.update(&application, expected).await?, None)
    };

    record_audit(
        repos,
        AuditLog::status_change(
            application.id,
            ENTITY_APPLICATION,
            expected.as_str(),
            application.status.as_str(),
            actor,
        ),
    )
    .await;

    if let Some(ref policy) = policy {
        record_audit(
            repos,
            AuditLog::creation(policy.id, ENTITY_POLICY, snapshot(policy), actor),
        )
        .await;
        tracing::info!(application_id = %application.id, policy_id = %policy.id, "policy issued");
    }

    Ok(ReviewOutcome { application, policy })
}
