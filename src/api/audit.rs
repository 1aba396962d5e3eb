//! Audit-log retrieval. Callers treat this as best-effort: a page showing
//! an audit trail logs fetch failures instead of breaking.

use tracing::warn;
use uuid::Uuid;

use super::client::ApiClient;
use super::types::AuditEntry;
use crate::error::ApiResult;

/// Audit entries recorded for a company, newest first.
pub async fn list(api: &ApiClient, company_id: Uuid) -> ApiResult<Vec<AuditEntry>> {
    api.get(&format!("/api/companies/{}/audit/", company_id))
        .await
}

/// Best-effort variant: failures are logged and produce an empty list.
pub async fn list_or_empty(api: &ApiClient, company_id: Uuid) -> Vec<AuditEntry> {
    match list(api, company_id).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(company = %company_id, error = %e, "Audit log fetch failed");
            Vec::new()
        }
    }
}
