//! Reporting aggregates for the admin dashboard.
//!
//! Everything here is a pure fold over records already loaded for the
//! `[from, to)` window.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::{Application, ApplicationStatus, Claim, ClaimStatus, Transaction};

pub const DEFAULT_WINDOW_DAYS: i64 = 30;
const RATIO_SCALE: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    /// Fills missing bounds: `to` defaults to `now`, `from` to thirty days before `to`.
    pub fn resolve(
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let to = to.unwrap_or(now);
        let from = from.unwrap_or(to - Duration::days(DEFAULT_WINDOW_DAYS));
        Self { from, to }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at < self.to
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub transaction_count: usize,
    pub total_volume: BigDecimal,
    pub total_premium: BigDecimal,
    pub claim_count: usize,
    pub total_claimed: BigDecimal,
    pub total_paid_claims: BigDecimal,
    /// Paid claims over collected premium; absent while no premium was collected.
    pub loss_ratio: Option<BigDecimal>,
    pub claims_by_status: BTreeMap<&'static str, usize>,
    pub applications_by_status: BTreeMap<&'static str, usize>,
}

fn sum<'a>(amounts: impl Iterator<Item = &'a BigDecimal>) -> BigDecimal {
    amounts.fold(BigDecimal::from(0), |acc, x| acc + x)
}

pub fn build_report(
    range: DateRange,
    transactions: &[Transaction],
    claims: &[Claim],
    applications: &[Application],
) -> AnalyticsReport {
    let transactions: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| range.contains(t.created_at))
        .collect();
    let claims: Vec<&Claim> = claims.iter().filter(|c| range.contains(c.created_at)).collect();

    let total_volume = sum(transactions.iter().map(|t| &t.total_amount));
    let total_premium = sum(transactions.iter().map(|t| &t.premium_amount));
    let total_claimed = sum(claims.iter().map(|c| &c.amount));
    let total_paid_claims = sum(
        claims
            .iter()
            .filter(|c| c.status == ClaimStatus::Paid)
            .map(|c| &c.amount),
    );

    let loss_ratio = if total_premium == BigDecimal::from(0) {
        None
    } else {
        Some((&total_paid_claims / &total_premium).round(RATIO_SCALE))
    };

    let mut claims_by_status: BTreeMap<&'static str, usize> =
        ClaimStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for claim in &claims {
        *claims_by_status.entry(claim.status.as_str()).or_default() += 1;
    }

    let mut applications_by_status: BTreeMap<&'static str, usize> =
        ApplicationStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for application in applications.iter().filter(|a| range.contains(a.created_at)) {
        *applications_by_status
            .entry(application.status.as_str())
            .or_default() += 1;
    }

    AnalyticsReport {
        from: range.from,
        to: range.to,
        transaction_count: transactions.len(),
        total_volume,
        total_premium,
        claim_count: claims.len(),
        total_claimed,
        total_paid_claims,
        loss_ratio,
        claims_by_status,
        applications_by_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::split_payment;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn payment(price: &str, at: DateTime<Utc>) -> Transaction {
        let split = split_payment(&dec("50"), &dec(price)).unwrap();
        let mut tx = Transaction::new(Uuid::new_v4(), Uuid::new_v4(), "USD".to_string(), None, split);
        tx.created_at = at;
        tx
    }

    fn claim(amount: &str, status: ClaimStatus, at: DateTime<Utc>) -> Claim {
        let mut claim = Claim::new(Uuid::new_v4(), Uuid::new_v4(), dec(amount), "broken screen".to_string());
        claim.status = status;
        claim.created_at = at;
        claim
    }

    #[test]
    fn totals_match_records_in_range() {
        let now = Utc::now();
        let range = DateRange::resolve(None, None, now);
        let inside = now - Duration::days(1);
        let outside = now - Duration::days(45);

        let transactions = vec![
            payment("25000", inside),
            payment("5000", inside),
            payment("90000", outside),
        ];
        let claims = vec![
            claim("40", ClaimStatus::Paid, inside),
            claim("500", ClaimStatus::New, inside),
            claim("999", ClaimStatus::Paid, outside),
        ];

        let report = build_report(range, &transactions, &claims, &[]);

        assert_eq!(report.transaction_count, 2);
        assert_eq!(report.total_premium, dec("200"));
        assert_eq!(report.total_volume, dec("30200"));
        assert_eq!(report.claim_count, 2);
        assert_eq!(report.total_claimed, dec("540"));
        assert_eq!(report.total_paid_claims, dec("40"));
        assert_eq!(report.loss_ratio, Some(dec("0.2")));
        assert_eq!(report.claims_by_status["paid"], 1);
        assert_eq!(report.claims_by_status["new"], 1);
        assert_eq!(report.claims_by_status["disputed"], 0);
    }

    #[test]
    fn loss_ratio_is_absent_without_premium() {
        let now = Utc::now();
        let range = DateRange::resolve(None, None, now);
        let claims = vec![claim("40", ClaimStatus::Paid, now - Duration::hours(1))];

        let report = build_report(range, &[], &claims, &[]);
        assert!(report.loss_ratio.is_none());
        assert_eq!(report.total_volume, BigDecimal::from(0));
    }

    #[test]
    fn range_is_half_open() {
        let to = Utc::now();
        let range = DateRange::resolve(Some(to - Duration::days(1)), Some(to), to);

        assert!(range.contains(to - Duration::days(1)));
        assert!(!range.contains(to));
    }

    #[test]
    fn applications_are_counted_per_status() {
        let now = Utc::now();
        let range = DateRange::resolve(None, None, now);
        let mut approved = Application::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            dec("1000"),
            dec("50"),
            None,
        );
        approved.status = ApplicationStatus::Approved;
        approved.created_at = now - Duration::days(2);
        let mut fresh = approved.clone();
        fresh.status = ApplicationStatus::New;

        let report = build_report(range, &[], &[], &[approved, fresh]);
        assert_eq!(report.applications_by_status["approved"], 1);
        assert_eq!(report.applications_by_status["new"], 1);
        assert_eq!(report.applications_by_status["rejected"], 0);
    }
}
