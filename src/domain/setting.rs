use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform-wide setting stored as free-form JSON under a unique key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Setting {
    pub fn new(key: String, value: serde_json::Value, updated_by: Option<String>) -> Self {
        Self {
            key,
            value,
            updated_by,
            updated_at: Utc::now(),
        }
    }
}
