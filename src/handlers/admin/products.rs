use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::audit::ENTITY_PRODUCT;
use crate::domain::{AuditLog, Product, ProductStatus};
use crate::error::AppError;
use crate::middleware::auth::Session;
use crate::services::{record_audit, snapshot};
use crate::validation::{sanitize_string, validate_max_len, DESCRIPTION_MAX_LEN};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub description: Option<String>,
    pub base_price: BigDecimal,
    pub coverage_min: BigDecimal,
    pub coverage_max: BigDecimal,
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_price: Option<BigDecimal>,
    pub coverage_min: Option<BigDecimal>,
    pub coverage_max: Option<BigDecimal>,
    pub status: Option<ProductStatus>,
}

fn clean_description(description: Option<String>) -> Result<Option<String>, AppError> {
    let description = description
        .map(|d| sanitize_string(&d))
        .filter(|d| !d.is_empty());
    if let Some(ref d) = description {
        validate_max_len("description", d, DESCRIPTION_MAX_LEN)?;
    }
    Ok(description)
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let products = state.repos.products.list(query.status).await?;
    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<CreateProduct>,
) -> Result<impl IntoResponse, AppError> {
    let product = Product::new(
        payload.name,
        clean_description(payload.description)?,
        payload.base_price,
        payload.coverage_min,
        payload.coverage_max,
        payload.status.unwrap_or(ProductStatus::Active),
    );
    product.validate()?;

    let saved = state.repos.products.insert(&product).await?;
    record_audit(
        &state.repos,
        AuditLog::creation(saved.id, ENTITY_PRODUCT, snapshot(&saved), session.sub.to_string()),
    )
    .await;

    tracing::info!(product_id = %saved.id, name = %saved.name, "product created");
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.repos.products.get(id).await?;
    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateProduct>,
) -> Result<impl IntoResponse, AppError> {
    let before = state.repos.products.get(id).await?;
    let mut product = before.clone();

    if let Some(name) = patch.name {
        product.name = sanitize_string(&name);
    }
    if patch.description.is_some() {
        product.description = clean_description(patch.description)?;
    }
    if let Some(base_price) = patch.base_price {
        product.base_price = base_price;
    }
    if let Some(min) = patch.coverage_min {
        product.coverage_min = min;
    }
    if let Some(max) = patch.coverage_max {
        product.coverage_max = max;
    }
    if let Some(status) = patch.status {
        product.status = status;
    }
    product.validate()?;
    product.updated_at = Utc::now();

    let saved = state.repos.products.update(&product).await?;
    record_audit(
        &state.repos,
        AuditLog::update(
            saved.id,
            ENTITY_PRODUCT,
            snapshot(&before),
            snapshot(&saved),
            session.sub.to_string(),
        ),
    )
    .await;

    Ok(Json(saved))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.repos.products.get(id).await?;
    state.repos.products.delete(id).await?;

    record_audit(
        &state.repos,
        AuditLog::deletion(id, ENTITY_PRODUCT, snapshot(&product), session.sub.to_string()),
    )
    .await;

    tracing::info!(product_id = %id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}
