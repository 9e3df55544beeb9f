//! Underwriting applications.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{ParseEnumError, TransitionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    New,
    UnderReview,
    AdditionalInfoRequired,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::New,
        ApplicationStatus::UnderReview,
        ApplicationStatus::AdditionalInfoRequired,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::New => "new",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::AdditionalInfoRequired => "additional_info_required",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn allowed_transitions(self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            New => &[UnderReview, AdditionalInfoRequired, Rejected],
            UnderReview => &[AdditionalInfoRequired, Approved, Rejected],
            AdditionalInfoRequired => &[UnderReview, Rejected],
            Approved | Rejected => &[],
        }
    }

    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn transition(self, next: ApplicationStatus) -> Result<ApplicationStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                entity: "application",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("application status", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Application {
    pub id: Uuid,
    pub startup_id: Uuid,
    pub product_id: Uuid,
    pub status: ApplicationStatus,
    pub requested_coverage: BigDecimal,
    pub risk_score: Option<i32>,
    pub recommended_premium: BigDecimal,
    pub actual_premium: Option<BigDecimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn new(
        startup_id: Uuid,
        product_id: Uuid,
        requested_coverage: BigDecimal,
        recommended_premium: BigDecimal,
        risk_score: Option<i32>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            startup_id,
            product_id,
            status: ApplicationStatus::New,
            requested_coverage,
            risk_score,
            recommended_premium,
            actual_premium: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Premium the policy will carry once approved.
    pub fn effective_premium(&self) -> &BigDecimal {
        self.actual_premium
            .as_ref()
            .unwrap_or(&self.recommended_premium)
    }

    pub fn apply_status(&mut self, next: ApplicationStatus) -> Result<ApplicationStatus, TransitionError> {
        let previous = self.status;
        self.status = previous.transition(next)?;
        self.updated_at = Utc::now();
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn application() -> Application {
        Application::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            BigDecimal::from(50_000),
            BigDecimal::from(250),
            Some(40),
        )
    }

    #[test]
    fn review_then_approve() {
        let mut app = application();
        app.apply_status(ApplicationStatus::UnderReview).unwrap();
        let previous = app.apply_status(ApplicationStatus::Approved).unwrap();

        assert_eq!(previous, ApplicationStatus::UnderReview);
        assert!(app.status.is_terminal());
    }

    #[test]
    fn cannot_approve_without_review() {
        let mut app = application();
        assert!(app.apply_status(ApplicationStatus::Approved).is_err());
        assert_eq!(app.status, ApplicationStatus::New);
    }

    #[test]
    fn info_request_loops_back_to_review() {
        let mut app = application();
        app.apply_status(ApplicationStatus::AdditionalInfoRequired).unwrap();
        app.apply_status(ApplicationStatus::UnderReview).unwrap();
        assert_eq!(app.status, ApplicationStatus::UnderReview);
    }

    #[test]
    fn terminal_states_have_no_exit() {
        assert!(ApplicationStatus::Approved.is_terminal());
        assert!(ApplicationStatus::Rejected.is_terminal());
        assert!(ApplicationStatus::Rejected
            .transition(ApplicationStatus::UnderReview)
            .is_err());
    }

    #[test]
    fn effective_premium_prefers_actual() {
        let mut app = application();
        assert_eq!(app.effective_premium(), &BigDecimal::from(250));

        app.actual_premium = Some(BigDecimal::from_str("199.99").unwrap());
        assert_eq!(app.effective_premium(), &BigDecimal::from_str("199.99").unwrap());
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!(
            "additional_info_required".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::AdditionalInfoRequired
        );
        assert!("pending".parse::<ApplicationStatus>().is_err());
    }
}
