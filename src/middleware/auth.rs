//! Bearer authentication for the three audiences.
//!
//! Staff and startups present an HS256 session token minted by the session
//! provider. Partner systems present an `ii_` API key; only its keyed digest
//! is stored, so lookups hash the presented key and match on the digest.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::domain::{Role, Startup};
use crate::error::AppError;
use crate::AppState;

pub const API_KEY_PREFIX: &str = "ii_";

/// Verified session claims, available to handlers as an `Extension`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub sub: Uuid,
    pub role: Role,
    pub exp: i64,
}

/// The startup a partner API key resolved to.
#[derive(Debug, Clone)]
pub struct PartnerStartup(pub Startup);

pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    api_key_pepper: Vec<u8>,
}

impl AuthKeys {
    pub fn new(session_secret: &str, api_key_pepper: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(session_secret.as_bytes()),
            decoding: DecodingKey::from_secret(session_secret.as_bytes()),
            api_key_pepper: api_key_pepper.as_bytes().to_vec(),
        }
    }

    pub fn issue_session(&self, sub: Uuid, role: Role, ttl: Duration) -> Result<String, AppError> {
        let claims = Session {
            sub,
            role,
            exp: (Utc::now() + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign session: {}", e)))
    }

    pub fn verify_session(&self, token: &str) -> Result<Session, AppError> {
        decode::<Session>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("invalid session token: {}", e)))
    }

    /// Hex HMAC-SHA256 of `api_key` under the configured pepper.
    pub fn digest_api_key(&self, api_key: &str) -> Result<String, AppError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.api_key_pepper)
            .map_err(|e| AppError::Internal(format!("invalid api key pepper: {}", e)))?;
        mac.update(api_key.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

pub fn generate_api_key() -> String {
    format!("{}{}", API_KEY_PREFIX, Uuid::new_v4().simple())
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("malformed authorization header".to_string()))
}

async fn authorize(
    state: &AppState,
    mut req: Request<Body>,
    next: Next<Body>,
    required: Option<Role>,
) -> Result<Response, AppError> {
    let session = state.auth.verify_session(bearer_token(req.headers())?)?;

    if let Some(role) = required {
        if session.role != role {
            tracing::warn!(sub = %session.sub, role = %session.role, required = %role, "role rejected");
            return Err(AppError::Forbidden(format!("requires the {} role", role)));
        }
    }

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

pub async fn require_session(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    authorize(&state, req, next, None).await
}

pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    authorize(&state, req, next, Some(Role::Admin)).await
}

pub async fn require_customer(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    authorize(&state, req, next, Some(Role::Customer)).await
}

pub async fn require_api_key(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    let key = bearer_token(req.headers())?;
    if !key.starts_with(API_KEY_PREFIX) {
        return Err(AppError::Unauthorized("malformed api key".to_string()));
    }

    let digest = state.auth.digest_api_key(key)?;
    let startup = state
        .repos
        .startups
        .find_by_api_key_hash(&digest)
        .await?
        .ok_or_else(|| AppError::Unauthorized("unknown api key".to_string()))?;

    req.extensions_mut().insert(PartnerStartup(startup));
    Ok(next.run(req).await)
}
