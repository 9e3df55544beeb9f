//! Claim intake and adjudication.

use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::{record_audit, snapshot};
use crate::domain::audit::ENTITY_CLAIM;
use crate::domain::{AuditLog, Claim, ClaimStatus, Startup};
use crate::error::AppError;
use crate::ports::Repositories;
use crate::validation::{
    sanitize_string, validate_max_len, validate_money, validate_positive_amount, validate_required,
    ValidationError, DESCRIPTION_MAX_LEN,
};

#[derive(Debug, Deserialize)]
pub struct NewClaim {
    pub policy_id: Uuid,
    pub amount: BigDecimal,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ClaimUpdate {
    pub status: ClaimStatus,
    pub resolution_note: Option<String>,
}

/// Files a claim against one of `startup`'s policies. The policy must be in
/// force and the amount may not exceed its coverage.
pub async fn file_claim(
    repos: &Repositories,
    startup: &Startup,
    input: NewClaim,
    actor: &str,
) -> Result<Claim, AppError> {
    let description = sanitize_string(&input.description);
    validate_required("description", &description)?;
    validate_max_len("description", &description, DESCRIPTION_MAX_LEN)?;
    validate_money("amount", &input.amount)?;
    validate_positive_amount("amount", &input.amount)?;

    let policy = repos.policies.get(input.policy_id).await?;
    if policy.startup_id != startup.id {
        // Someone else's policy looks the same as a missing one.
        return Err(AppError::NotFound(format!("policy {}", input.policy_id)));
    }
    if !policy.is_in_force(Utc::now()) {
        return Err(ValidationError::new("policy_id", "policy is not active").into());
    }
    if input.amount > policy.coverage_amount {
        return Err(ValidationError::new(
            "amount",
            format!("must not exceed the policy coverage of {}", policy.coverage_amount),
        )
        .into());
    }

    let claim = Claim::new(policy.id, startup.id, input.amount, description);
    let saved = repos.claims.insert(&claim).await?;
    record_audit(repos, AuditLog::creation(saved.id, ENTITY_CLAIM, snapshot(&saved), actor)).await;

    tracing::info!(claim_id = %saved.id, policy_id = %policy.id, "claim filed");
    Ok(saved)
}

/// Applies an adjudication step. Fails with a conflict when the transition is
/// not allowed or the claim changed since it was read.
pub async fn update_claim_status(
    repos: &Repositories,
    id: Uuid,
    update: ClaimUpdate,
    actor: &str,
) -> Result<Claim, AppError> {
    let note = update
        .resolution_note
        .map(|n| sanitize_string(&n))
        .filter(|n| !n.is_empty());
    if let Some(ref n) = note {
        validate_max_len("resolution_note", n, DESCRIPTION_MAX_LEN)?;
    }

    let mut claim = repos.claims.get(id).await?;
    let previous = claim.apply_status(update.status, note)?;
    let saved = repos.claims.update(&claim, previous).await?;

    record_audit(
        repos,
        AuditLog::status_change(saved.id, ENTITY_CLAIM, previous.as_str(), saved.status.as_str(), actor),
    )
    .await;

    tracing::info!(claim_id = %saved.id, from = %previous, to = %saved.status, "claim status changed");
    Ok(saved)
}
