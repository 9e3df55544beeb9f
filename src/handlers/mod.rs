pub mod admin;
pub mod auth;
pub mod customer;
pub mod partner;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::AppError;
use crate::health::check_health;
use crate::AppState;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Pages a list that was filtered in memory.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.limit() as usize)
            .collect()
    }
}

pub(crate) fn parse_timestamp(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, AppError> {
    raw.map(|value| {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| AppError::BadRequest(format!("Invalid '{}' date: {}", field, e)))
    })
    .transpose()
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let health = check_health(&state.health_checks, state.start_time).await;

    let status_code = if health.status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(health))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_clamps() {
        let default = Pagination::default();
        assert_eq!(default.limit(), 20);
        assert_eq!(default.offset(), 0);

        let wild = Pagination {
            limit: Some(5_000),
            offset: Some(-3),
        };
        assert_eq!(wild.limit(), 100);
        assert_eq!(wild.offset(), 0);

        let page = Pagination {
            limit: Some(2),
            offset: Some(1),
        };
        assert_eq!(page.apply(vec![1, 2, 3, 4]), vec![2, 3]);
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("from", None).unwrap().is_none());
        assert!(parse_timestamp("from", Some("2024-03-01T00:00:00Z")).unwrap().is_some());
        assert!(matches!(
            parse_timestamp("from", Some("yesterday")),
            Err(AppError::BadRequest(_))
        ));
    }
}
