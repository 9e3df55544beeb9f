//! Audit trail entries written alongside admin and customer mutations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const ENTITY_PRODUCT: &str = "product";
pub const ENTITY_STARTUP: &str = "startup";
pub const ENTITY_APPLICATION: &str = "application";
pub const ENTITY_POLICY: &str = "policy";
pub const ENTITY_CLAIM: &str = "claim";
pub const ENTITY_TRANSACTION: &str = "transaction";
pub const ENTITY_SETTLEMENT: &str = "settlement";
pub const ENTITY_SETTING: &str = "setting";

pub const ACTION_CREATED: &str = "created";
pub const ACTION_UPDATED: &str = "updated";
pub const ACTION_STATUS_CHANGED: &str = "status_changed";
pub const ACTION_DELETED: &str = "deleted";

pub const SYSTEM_ACTOR: &str = "system";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditLog {
    pub id: Uuid,
    pub entity_id: Uuid,
    pub entity_type: String,
    pub action: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditLog {
    pub fn new(
        entity_id: Uuid,
        entity_type: &str,
        action: &str,
        old_value: Option<Value>,
        new_value: Option<Value>,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_id,
            entity_type: entity_type.to_string(),
            action: action.to_string(),
            old_value,
            new_value,
            actor: actor.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn creation(entity_id: Uuid, entity_type: &str, new_value: Value, actor: impl Into<String>) -> Self {
        Self::new(entity_id, entity_type, ACTION_CREATED, None, Some(new_value), actor)
    }

    pub fn update(
        entity_id: Uuid,
        entity_type: &str,
        old_value: Value,
        new_value: Value,
        actor: impl Into<String>,
    ) -> Self {
        Self::new(
            entity_id,
            entity_type,
            ACTION_UPDATED,
            Some(old_value),
            Some(new_value),
            actor,
        )
    }

    pub fn status_change(
        entity_id: Uuid,
        entity_type: &str,
        from: &str,
        to: &str,
        actor: impl Into<String>,
    ) -> Self {
        Self::new(
            entity_id,
            entity_type,
            ACTION_STATUS_CHANGED,
            Some(serde_json::json!({ "status": from })),
            Some(serde_json::json!({ "status": to })),
            actor,
        )
    }

    pub fn deletion(entity_id: Uuid, entity_type: &str, old_value: Value, actor: impl Into<String>) -> Self {
        Self::new(entity_id, entity_type, ACTION_DELETED, Some(old_value), None, actor)
    }
}
