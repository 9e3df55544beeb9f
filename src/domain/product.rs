use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ParseEnumError;
use crate::validation::{
    sanitize_string, validate_max_len, validate_money, validate_non_negative, validate_required,
    ValidationError, ValidationResult, NAME_MAX_LEN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Active,
    Draft,
    Archived,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Draft => "draft",
            ProductStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProductStatus::Active),
            "draft" => Ok(ProductStatus::Draft),
            "archived" => Ok(ProductStatus::Archived),
            other => Err(ParseEnumError::new("product status", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub base_price: BigDecimal,
    pub coverage_min: BigDecimal,
    pub coverage_max: BigDecimal,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        name: String,
        description: Option<String>,
        base_price: BigDecimal,
        coverage_min: BigDecimal,
        coverage_max: BigDecimal,
        status: ProductStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: sanitize_string(&name),
            description,
            base_price,
            coverage_min,
            coverage_max,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        validate_required("name", &self.name)?;
        validate_max_len("name", &self.name, NAME_MAX_LEN)?;
        validate_money("base_price", &self.base_price)?;
        validate_non_negative("base_price", &self.base_price)?;
        validate_money("coverage_min", &self.coverage_min)?;
        validate_non_negative("coverage_min", &self.coverage_min)?;
        validate_money("coverage_max", &self.coverage_max)?;

        if self.coverage_min >= self.coverage_max {
            return Err(ValidationError::new(
                "coverage_max",
                "must be greater than coverage_min",
            ));
        }

        Ok(())
    }

    pub fn covers(&self, amount: &BigDecimal) -> bool {
        amount >= &self.coverage_min && amount <= &self.coverage_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(min: i64, max: i64) -> Product {
        Product::new(
            "Cyber Liability".to_string(),
            None,
            BigDecimal::from(50),
            BigDecimal::from(min),
            BigDecimal::from(max),
            ProductStatus::Draft,
        )
    }

    #[test]
    fn accepts_ordered_coverage_bounds() {
        assert!(product(1_000, 100_000).validate().is_ok());
    }

    #[test]
    fn rejects_inverted_or_equal_bounds() {
        assert_eq!(
            product(100_000, 1_000).validate().unwrap_err().field,
            "coverage_max"
        );
        assert!(product(5_000, 5_000).validate().is_err());
    }

    #[test]
    fn rejects_negative_price() {
        let mut p = product(0, 10);
        p.base_price = BigDecimal::from(-5);
        assert_eq!(p.validate().unwrap_err().field, "base_price");
    }

    #[test]
    fn name_is_sanitized_and_required() {
        let p = Product::new(
            "  Key \t Person  ".to_string(),
            None,
            BigDecimal::from(1),
            BigDecimal::from(0),
            BigDecimal::from(1),
            ProductStatus::Active,
        );
        assert_eq!(p.name, "Key Person");

        let mut blank = product(0, 1);
        blank.name = "   ".to_string();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn coverage_bounds_are_inclusive() {
        let p = product(1_000, 2_000);
        assert!(p.covers(&BigDecimal::from(1_000)));
        assert!(p.covers(&BigDecimal::from(2_000)));
        assert!(!p.covers(&BigDecimal::from(2_001)));
    }
}
