use axum::extract::{Extension, Path, Query};
use axum::routing::get;
use axum::Router;

use crate::common::{ok, ApiResult, AuditLogId, PageParams, Paged};
use crate::domains::audit::activities;
use crate::domains::audit::models::{AuditLog, AuditLogFilter};
use crate::server::app::AppState;
use crate::server::extractors::AdminUser;

pub fn router() -> Router {
    Router::new()
        .route("/admin/audit-logs", get(list_audit_logs))
        .route("/admin/audit-logs/:id", get(get_audit_log))
}

async fn list_audit_logs(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    Query(filter): Query<AuditLogFilter>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<AuditLog>> {
    ok(activities::list_audit_logs(filter, page, &admin, &state.deps).await?)
}

async fn get_audit_log(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<AuditLogId>,
) -> ApiResult<AuditLog> {
    ok(activities::get_audit_log(id, &admin, &state.deps).await?)
}
