//! Free-text and status filtering for the admin list views.

use crate::domain::{Claim, ClaimStatus, KycStatus, Startup};

/// Lowercased needle, or `None` when the search matches everything.
fn needle(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn any_contains<'a>(needle: &str, haystacks: impl IntoIterator<Item = &'a str>) -> bool {
    haystacks
        .into_iter()
        .any(|h| h.to_lowercase().contains(needle))
}

pub fn filter_startups(
    items: Vec<Startup>,
    search: Option<&str>,
    kyc_status: Option<KycStatus>,
) -> Vec<Startup> {
    let needle = needle(search);
    items
        .into_iter()
        .filter(|s| kyc_status.map_or(true, |status| s.kyc_status == status))
        .filter(|s| {
            needle.as_deref().map_or(true, |n| {
                any_contains(
                    n,
                    [
                        s.company_name.as_str(),
                        s.founder_name.as_str(),
                        s.founder_email.as_str(),
                        s.industry.as_deref().unwrap_or_default(),
                    ],
                )
            })
        })
        .collect()
}

pub fn filter_claims(
    items: Vec<Claim>,
    search: Option<&str>,
    status: Option<ClaimStatus>,
) -> Vec<Claim> {
    let needle = needle(search);
    items
        .into_iter()
        .filter(|c| status.map_or(true, |s| c.status == s))
        .filter(|c| {
            needle.as_deref().map_or(true, |n| {
                let id = c.id.to_string();
                any_contains(n, [c.description.as_str(), id.as_str()])
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    fn startup(name: &str, industry: Option<&str>, kyc: KycStatus) -> Startup {
        let mut s = Startup::new(
            Uuid::new_v4(),
            name.to_string(),
            "Founder".to_string(),
            format!("team@{}.io", name.to_lowercase().replace(' ', "")),
        );
        s.industry = industry.map(str::to_string);
        s.kyc_status = kyc;
        s
    }

    fn sample() -> Vec<Startup> {
        vec![
            startup("TechFlow Hardware", Some("Hardware"), KycStatus::Verified),
            startup("GreenLeaf Foods", Some("Food"), KycStatus::Pending),
            startup("Orbit Logistics", Some("FinTech"), KycStatus::Pending),
        ]
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let found = filter_startups(sample(), Some("Tech"), None);
        let names: Vec<_> = found.iter().map(|s| s.company_name.as_str()).collect();
        assert_eq!(names, vec!["TechFlow Hardware", "Orbit Logistics"]);

        let found = filter_startups(sample(), Some("greenleaf"), None);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn search_and_status_combine() {
        let found = filter_startups(sample(), Some("Tech"), Some(KycStatus::Verified));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].company_name, "TechFlow Hardware");
    }

    #[test]
    fn empty_search_matches_everything() {
        assert_eq!(filter_startups(sample(), None, None).len(), 3);
        assert_eq!(filter_startups(sample(), Some("   "), None).len(), 3);
        assert_eq!(filter_startups(sample(), Some("nothing"), None).len(), 0);
    }

    #[test]
    fn claims_filter_by_description_id_and_status() {
        let mut flood = Claim::new(Uuid::new_v4(), Uuid::new_v4(), BigDecimal::from(10), "Flooded warehouse".to_string());
        flood.status = ClaimStatus::UnderInvestigation;
        let theft = Claim::new(Uuid::new_v4(), Uuid::new_v4(), BigDecimal::from(20), "Laptop theft".to_string());
        let theft_id = theft.id.to_string();
        let claims = vec![flood, theft];

        assert_eq!(filter_claims(claims.clone(), Some("FLOOD"), None).len(), 1);
        assert_eq!(filter_claims(claims.clone(), Some(&theft_id[..8]), None).len(), 1);
        assert_eq!(
            filter_claims(claims.clone(), None, Some(ClaimStatus::UnderInvestigation)).len(),
            1
        );
        assert!(filter_claims(claims, Some("theft"), Some(ClaimStatus::Paid)).is_empty());
    }
}
