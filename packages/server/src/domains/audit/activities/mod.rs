//! Audit trail activities.
//!
//! `record` is called from every admin-facing mutation. It never fails the
//! caller: a lost audit row is logged, the user's operation still succeeds.

use anyhow::Result;
use tracing::{error, info};

use crate::common::{AdminCapability, ApiError, AuditLogId, AuthUser, PageParams, Paged};
use crate::domains::audit::models::{AuditEntry, AuditLog, AuditLogFilter};
use crate::kernel::ServerDeps;

pub async fn record(entry: AuditEntry, deps: &ServerDeps) {
    match AuditLog::insert(&entry, &deps.db_pool).await {
        Ok(log) => info!(
            audit_id = %log.id,
            action = %entry.action,
            entity_type = %entry.entity_type,
            "Audit entry recorded"
        ),
        Err(e) => error!(
            error = %e,
            action = %entry.action,
            entity_type = %entry.entity_type,
            "Failed to record audit entry"
        ),
    }
}

pub async fn list_audit_logs(
    filter: AuditLogFilter,
    page: PageParams,
    actor: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<AuditLog>> {
    actor
        .actor()
        .can(AdminCapability::ViewAuditLogs)
        .check(deps)
        .await?;

    let items =
        AuditLog::find_filtered(&filter, page.limit(), page.offset(), &deps.db_pool).await?;
    let total = AuditLog::count_filtered(&filter, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

pub async fn get_audit_log(id: AuditLogId, actor: &AuthUser, deps: &ServerDeps) -> Result<AuditLog> {
    actor
        .actor()
        .can(AdminCapability::ViewAuditLogs)
        .check(deps)
        .await?;

    AuditLog::find_by_id(id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Audit log").into())
}
