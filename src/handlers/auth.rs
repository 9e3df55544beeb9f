use axum::{response::IntoResponse, Extension, Json};
use chrono::{TimeZone, Utc};
use serde_json::json;

use crate::middleware::auth::Session;

/// `GET /api/auth/session`: the verified claims of the caller's token.
pub async fn session(Extension(session): Extension<Session>) -> impl IntoResponse {
    let expires_at = Utc.timestamp_opt(session.exp, 0).single();

    Json(json!({
        "sub": session.sub,
        "role": session.role,
        "exp": session.exp,
        "expires_at": expires_at,
    }))
}
