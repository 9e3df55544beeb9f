use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{Application, ParseEnumError};

pub const POLICY_TERM_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    Active,
    Expired,
    Cancelled,
}

impl PolicyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyStatus::Active => "active",
            PolicyStatus::Expired => "expired",
            PolicyStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(PolicyStatus::Active),
            "expired" => Ok(PolicyStatus::Expired),
            "cancelled" => Ok(PolicyStatus::Cancelled),
            other => Err(ParseEnumError::new("policy status", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Policy {
    pub id: Uuid,
    pub application_id: Uuid,
    pub startup_id: Uuid,
    pub product_id: Uuid,
    pub coverage_amount: BigDecimal,
    pub premium: BigDecimal,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub status: PolicyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Policy {
    /// Builds the policy issued when `application` is approved at `issued_at`.
    pub fn from_application(application: &Application, issued_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            application_id: application.id,
            startup_id: application.startup_id,
            product_id: application.product_id,
            coverage_amount: application.requested_coverage.clone(),
            premium: application.effective_premium().clone(),
            valid_from: issued_at,
            valid_until: issued_at + Duration::days(POLICY_TERM_DAYS),
            status: PolicyStatus::Active,
            created_at: issued_at,
            updated_at: issued_at,
        }
    }

    /// Active and inside its validity window.
    pub fn is_in_force(&self, at: DateTime<Utc>) -> bool {
        self.status == PolicyStatus::Active && self.valid_from <= at && at < self.valid_until
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_terms_from_application() {
        let mut application = Application::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            BigDecimal::from(75_000),
            BigDecimal::from(400),
            None,
        );
        application.actual_premium = Some(BigDecimal::from(380));
        let now = Utc::now();

        let policy = Policy::from_application(&application, now);

        assert_eq!(policy.application_id, application.id);
        assert_eq!(policy.coverage_amount, BigDecimal::from(75_000));
        assert_eq!(policy.premium, BigDecimal::from(380));
        assert_eq!(policy.valid_until - policy.valid_from, Duration::days(365));
        assert!(policy.is_in_force(now));
        assert!(!policy.is_in_force(now + Duration::days(366)));
    }
}
