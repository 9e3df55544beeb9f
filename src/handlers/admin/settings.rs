use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::audit::ENTITY_SETTING;
use crate::domain::{AuditLog, Setting};
use crate::error::AppError;
use crate::middleware::auth::Session;
use crate::services::record_audit;
use crate::validation::{validate_max_len, validate_required, ValidationError, SETTING_KEY_MAX_LEN};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PutSetting {
    pub value: Value,
}

/// Stable audit id for a setting key.
pub fn setting_entity_id(key: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("setting:{}", key).as_bytes())
}

fn validate_key(key: &str) -> Result<(), ValidationError> {
    validate_required("key", key)?;
    validate_max_len("key", key, SETTING_KEY_MAX_LEN)?;
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(ValidationError::new(
            "key",
            "may only contain letters, digits, '_', '-' and '.'",
        ));
    }
    Ok(())
}

pub async fn list_settings(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let settings = state.repos.settings.list().await?;
    Ok(Json(settings))
}

pub async fn put_setting(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(key): Path<String>,
    Json(payload): Json<PutSetting>,
) -> Result<impl IntoResponse, AppError> {
    validate_key(&key)?;

    let previous = state.repos.settings.get(&key).await?;
    let actor = session.sub.to_string();
    let saved = state
        .repos
        .settings
        .put(&Setting::new(key, payload.value, Some(actor.clone())))
        .await?;

    record_audit(
        &state.repos,
        AuditLog::update(
            setting_entity_id(&saved.key),
            ENTITY_SETTING,
            previous.map_or(Value::Null, |p| json!({ "key": p.key, "value": p.value })),
            json!({ "key": saved.key, "value": saved.value }),
            actor,
        ),
    )
    .await;

    Ok(Json(saved))
}
