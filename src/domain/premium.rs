//! Premium calculation and payment split.
//!
//! A product's premium is charged per started block of [`PREMIUM_PRICE_UNIT`]
//! of the insured price: `base_price * ceil(product_price / 10000)`.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

pub use crate::validation::MONEY_SCALE;
use crate::validation::{validate_money, validate_non_negative, ValidationError};

pub const PREMIUM_PRICE_UNIT: i64 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSplit {
    pub base_amount: BigDecimal,
    pub premium_amount: BigDecimal,
    pub total_amount: BigDecimal,
}

pub fn round_money(value: &BigDecimal) -> BigDecimal {
    value.round(MONEY_SCALE).with_scale(MONEY_SCALE)
}

/// Ceiling of a non-negative decimal.
fn ceil_non_negative(value: &BigDecimal) -> BigDecimal {
    let truncated = value.with_scale(0);
    if &truncated < value {
        truncated + BigDecimal::from(1)
    } else {
        truncated
    }
}

pub fn calculate_premium(
    base_price: &BigDecimal,
    product_price: &BigDecimal,
) -> Result<BigDecimal, ValidationError> {
    validate_money("base_price", base_price)?;
    validate_non_negative("base_price", base_price)?;
    validate_money("product_price", product_price)?;
    validate_non_negative("product_price", product_price)?;

    let units = ceil_non_negative(&(product_price / BigDecimal::from(PREMIUM_PRICE_UNIT)));
    Ok(round_money(&(base_price * units)))
}

pub fn split_payment(
    base_price: &BigDecimal,
    product_price: &BigDecimal,
) -> Result<PaymentSplit, ValidationError> {
    let premium_amount = calculate_premium(base_price, product_price)?;
    // Exact: the price already has at most MONEY_SCALE fractional digits.
    let base_amount = product_price.with_scale(MONEY_SCALE);
    let total_amount = &base_amount + &premium_amount;

    Ok(PaymentSplit {
        base_amount,
        premium_amount,
        total_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn charges_per_started_block() {
        assert_eq!(calculate_premium(&dec("50"), &dec("25000")).unwrap(), dec("150"));
        assert_eq!(calculate_premium(&dec("50"), &dec("10000")).unwrap(), dec("50"));
        assert_eq!(calculate_premium(&dec("50"), &dec("10000.01")).unwrap(), dec("100"));
        assert_eq!(calculate_premium(&dec("50"), &dec("1")).unwrap(), dec("50"));
    }

    #[test]
    fn zero_price_has_zero_premium() {
        assert_eq!(calculate_premium(&dec("50"), &dec("0")).unwrap(), dec("0"));
    }

    #[test]
    fn premium_is_reported_in_cents() {
        let premium = calculate_premium(&dec("19.99"), &dec("5000")).unwrap();
        assert_eq!(premium.to_string(), "19.99");
        assert_eq!(
            calculate_premium(&dec("50"), &dec("25000")).unwrap().to_string(),
            "150.00"
        );
    }

    #[test]
    fn rejects_sub_cent_and_out_of_range_inputs() {
        let err = calculate_premium(&dec("19.995"), &dec("5000")).unwrap_err();
        assert_eq!(err.field, "base_price");

        let err = split_payment(&dec("25"), &dec("0.001")).unwrap_err();
        assert_eq!(err.field, "product_price");
        assert!(split_payment(&dec("25"), &dec("1299.999")).is_err());
        assert!(split_payment(&dec("25"), &dec("1e20")).is_err());
    }

    #[test]
    fn rejects_negative_inputs() {
        let err = calculate_premium(&dec("-1"), &dec("100")).unwrap_err();
        assert_eq!(err.field, "base_price");

        let err = calculate_premium(&dec("10"), &dec("-100")).unwrap_err();
        assert_eq!(err.field, "product_price");
    }

    #[test]
    fn split_adds_premium_to_base() {
        let split = split_payment(&dec("25"), &dec("1299.99")).unwrap();

        assert_eq!(split.base_amount, dec("1299.99"));
        assert_eq!(split.premium_amount, dec("25"));
        assert_eq!(split.total_amount, dec("1324.99"));
    }

    #[test]
    fn split_keeps_the_captured_price() {
        let split = split_payment(&dec("25"), &dec("0.01")).unwrap();
        assert_eq!(split.base_amount, dec("0.01"));
        assert_eq!(split.base_amount.to_string(), "0.01");

        let split = split_payment(&dec("25"), &dec("25000")).unwrap();
        assert_eq!(split.base_amount.to_string(), "25000.00");
    }
}
