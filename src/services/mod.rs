pub mod analytics;
pub mod claims;
pub mod payments;
pub mod search;
pub mod settlement;
pub mod underwriting;

pub use settlement::SettlementService;

use serde::Serialize;
use serde_json::Value;

use crate::domain::AuditLog;
use crate::ports::Repositories;

/// JSON snapshot of a record for the audit trail.
pub(crate) fn snapshot<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Appends to the audit trail after the audited write has committed. A failed
/// append is logged and does not fail the request.
pub(crate) async fn record_audit(repos: &Repositories, entry: AuditLog) {
    if let Err(e) = repos.audit_logs.record(&entry).await {
        tracing::error!(
            entity_id = %entry.entity_id,
            entity_type = %entry.entity_type,
            action = %entry.action,
            error = %e,
            "failed to record audit entry"
        );
    }
}
