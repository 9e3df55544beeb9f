use bigdecimal::num_bigint::Sign;
use sqlx::types::BigDecimal;
use std::fmt;

pub const NAME_MAX_LEN: usize = 200;
pub const DESCRIPTION_MAX_LEN: usize = 5_000;
pub const EMAIL_MAX_LEN: usize = 254;
pub const REFERENCE_MAX_LEN: usize = 255;
pub const SETTING_KEY_MAX_LEN: usize = 100;
pub const RISK_SCORE_MAX: i32 = 100;
pub const ALLOWED_CURRENCIES: &[&str] = &["USD", "EUR", "GBP", "INR"];
pub const MONEY_SCALE: i64 = 2;
pub const MONEY_MAX: i64 = 1_000_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.len() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_enum(field: &'static str, value: &str, allowed: &[&str]) -> ValidationResult {
    if allowed.iter().all(|candidate| value != *candidate) {
        return Err(ValidationError::new(
            field,
            format!("must be one of: {}", allowed.join(", ")),
        ));
    }

    Ok(())
}

pub fn validate_email(field: &'static str, email: &str) -> ValidationResult {
    validate_required(field, email)?;
    validate_max_len(field, email, EMAIL_MAX_LEN)?;

    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();

    if local.is_empty()
        || domain.is_empty()
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(ValidationError::new(field, "must be a valid email address"));
    }

    Ok(())
}

pub fn validate_currency(currency: &str) -> ValidationResult {
    let currency = sanitize_string(currency);
    validate_required("currency", &currency)?;

    if currency.len() != 3 || !currency.chars().all(|ch| ch.is_ascii_uppercase()) {
        return Err(ValidationError::new(
            "currency",
            "must be a 3-letter uppercase ISO code",
        ));
    }

    validate_enum("currency", &currency, ALLOWED_CURRENCIES)
}

pub fn validate_risk_score(score: i32) -> ValidationResult {
    if !(0..=RISK_SCORE_MAX).contains(&score) {
        return Err(ValidationError::new(
            "risk_score",
            format!("must be between 0 and {}", RISK_SCORE_MAX),
        ));
    }

    Ok(())
}

pub fn validate_non_negative(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    if amount < &BigDecimal::from(0) {
        return Err(ValidationError::new(field, "must not be negative"));
    }

    Ok(())
}

/// Bounds an inbound money value before any arithmetic touches it: at most
/// [`MONEY_SCALE`] fractional digits and an absolute value of at most
/// [`MONEY_MAX`].
pub fn validate_money(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    let (digits, scale) = amount.as_bigint_and_exponent();
    if scale > MONEY_SCALE {
        return Err(ValidationError::new(
            field,
            format!("must have at most {} decimal places", MONEY_SCALE),
        ));
    }

    // A negative scale means `digits * 10^-scale`; anything past 10^15 with
    // non-zero digits is out of range, so skip the comparison.
    let too_large = if scale < -15 {
        digits.sign() != Sign::NoSign
    } else {
        amount.abs() > BigDecimal::from(MONEY_MAX)
    };
    if too_large {
        return Err(ValidationError::new(
            field,
            format!("must not exceed {}", MONEY_MAX),
        ));
    }

    Ok(())
}

pub fn validate_positive_amount(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn validates_required_field() {
        assert!(validate_required("field", "value").is_ok());
        assert!(validate_required("field", "   ").is_err());
    }

    #[test]
    fn validates_max_len() {
        assert!(validate_max_len("field", "abc", 3).is_ok());
        assert!(validate_max_len("field", "abcd", 3).is_err());
    }

    #[test]
    fn validates_enum_values() {
        assert!(validate_enum("status", "active", &["active", "draft"]).is_ok());
        assert!(validate_enum("status", "unknown", &["active", "draft"]).is_err());
    }

    #[test]
    fn sanitizes_string() {
        assert_eq!(sanitize_string("  hello\tworld  "), "hello world");
        assert_eq!(sanitize_string("single"), "single");
        assert_eq!(sanitize_string(" \n "), "");
        assert_eq!(sanitize_string("ab\u{0000}cd\u{0007}"), "abcd");
    }

    #[test]
    fn validates_email() {
        assert!(validate_email("email", "founder@techflow.io").is_ok());
        assert!(validate_email("email", "founder@localhost").is_err());
        assert!(validate_email("email", "@techflow.io").is_err());
        assert!(validate_email("email", "founder techflow.io").is_err());
        assert!(validate_email("email", "a b@techflow.io").is_err());
        assert!(validate_email("email", "").is_err());
    }

    #[test]
    fn validates_currency() {
        assert!(validate_currency("USD").is_ok());
        assert!(validate_currency(" EUR ").is_ok());
        assert!(validate_currency("usd").is_err());
        assert!(validate_currency("JPY").is_err());
        assert!(validate_currency("USDC").is_err());
    }

    #[test]
    fn validates_risk_score_range() {
        assert!(validate_risk_score(0).is_ok());
        assert!(validate_risk_score(100).is_ok());
        assert!(validate_risk_score(101).is_err());
        assert!(validate_risk_score(-1).is_err());
    }

    #[test]
    fn validates_amount_signs() {
        let positive = BigDecimal::from_str("1.23").expect("valid decimal");
        let zero = BigDecimal::from(0);
        let negative = BigDecimal::from(-1);

        assert!(validate_positive_amount("amount", &positive).is_ok());
        assert!(validate_positive_amount("amount", &zero).is_err());
        assert!(validate_non_negative("amount", &zero).is_ok());
        assert!(validate_non_negative("amount", &negative).is_err());
    }

    #[test]
    fn validates_money_scale_and_magnitude() {
        let dec = |s: &str| BigDecimal::from_str(s).expect("valid decimal");

        assert!(validate_money("price", &dec("1299.99")).is_ok());
        assert!(validate_money("price", &dec("1e3")).is_ok());
        assert!(validate_money("price", &dec("0e100")).is_ok());
        assert!(validate_money("price", &dec("1000000000000000")).is_ok());

        assert!(validate_money("price", &dec("0.001")).is_err());
        assert!(validate_money("price", &dec("1299.999")).is_err());
        assert!(validate_money("price", &dec("1000000000000000.01")).is_err());
        assert!(validate_money("price", &dec("-1e16")).is_err());
    }

    #[test]
    fn rejects_extreme_exponents_quickly() {
        let tiny: BigDecimal = serde_json::from_str("\"1e-2000000\"").expect("valid decimal");
        let huge: BigDecimal = serde_json::from_str("\"1e2000000\"").expect("valid decimal");

        let start = std::time::Instant::now();
        let err = validate_money("product_price", &tiny).unwrap_err();
        assert!(err.message.contains("decimal places"));
        let err = validate_money("product_price", &huge).unwrap_err();
        assert!(err.message.contains("must not exceed"));
        assert!(start.elapsed() < std::time::Duration::from_secs(1));
    }
}
