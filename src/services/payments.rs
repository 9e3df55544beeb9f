//! Partner-facing premium quotes and payment capture.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{split_payment, PaymentSplit, Product, ProductStatus, Startup, Transaction};
use crate::error::AppError;
use crate::ports::Repositories;
use crate::validation::{
    sanitize_string, validate_currency, validate_max_len, validate_money, validate_non_negative,
    validate_positive_amount, REFERENCE_MAX_LEN,
};

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Deserialize)]
pub struct PremiumQuoteRequest {
    pub product_id: Uuid,
    pub product_price: BigDecimal,
}

#[derive(Debug, Serialize)]
pub struct PremiumQuote {
    pub product_id: Uuid,
    pub base_price: BigDecimal,
    #[serde(flatten)]
    pub split: PaymentSplit,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub product_id: Uuid,
    pub product_price: BigDecimal,
    pub currency: Option<String>,
    pub reference: Option<String>,
}

async fn active_product(repos: &Repositories, product_id: Uuid) -> Result<Product, AppError> {
    let product = repos.products.get(product_id).await?;
    if product.status != ProductStatus::Active {
        return Err(AppError::NotFound(format!("product {}", product_id)));
    }
    Ok(product)
}

pub async fn quote_premium(
    repos: &Repositories,
    request: PremiumQuoteRequest,
) -> Result<PremiumQuote, AppError> {
    validate_money("product_price", &request.product_price)?;
    validate_non_negative("product_price", &request.product_price)?;
    let product = active_product(repos, request.product_id).await?;
    let split = split_payment(&product.base_price, &request.product_price)?;

    Ok(PremiumQuote {
        product_id: product.id,
        base_price: product.base_price,
        split,
    })
}

/// Records a captured payment for `startup`, split into base and premium.
pub async fn record_payment(
    repos: &Repositories,
    startup: &Startup,
    request: PaymentRequest,
) -> Result<Transaction, AppError> {
    validate_money("product_price", &request.product_price)?;
    validate_positive_amount("product_price", &request.product_price)?;

    let currency = request
        .currency
        .as_deref()
        .map(sanitize_string)
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    validate_currency(&currency)?;

    let reference = request
        .reference
        .map(|r| sanitize_string(&r))
        .filter(|r| !r.is_empty());
    if let Some(ref r) = reference {
        validate_max_len("reference", r, REFERENCE_MAX_LEN)?;
    }

    let product = active_product(repos, request.product_id).await?;
    let split = split_payment(&product.base_price, &request.product_price)?;

    let tx = Transaction::new(startup.id, product.id, currency, reference, split);
    let saved = repos.transactions.insert(&tx).await?;

    tracing::info!(
        transaction_id = %saved.id,
        startup_id = %startup.id,
        total = %saved.total_amount,
        currency = %saved.currency,
        "payment recorded"
    );
    Ok(saved)
}
