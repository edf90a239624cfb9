//! Report handling. Users flag campaigns or organizations; admins triage,
//! assign and close them. An upheld fraud report costs the organization
//! transparency points.

use anyhow::Result;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::common::{
    AdminCapability, ApiError, AuthUser, CampaignId, OrganizationId, PageParams, Paged,
    ReportId, RequestMeta, UserRole,
};
use crate::domains::audit::{self, AuditAction, AuditEntry};
use crate::domains::auth::models::User;
use crate::domains::campaigns::models::Campaign;
use crate::domains::notifications::{self, NotificationType};
use crate::domains::organizations::models::Organization;
use crate::domains::reports::data::{
    AdminReportQuery, AssignReportInput, CreateReportInput, ResolveReportInput,
};
use crate::domains::reports::models::{Report, ReportEntityType, ReportStatus, ReportType};
use crate::domains::transparency::{self, ScoreEvent};
use crate::kernel::ServerDeps;

/// Organization behind a report target, or None when the target is gone.
async fn target_organization(
    entity_type: ReportEntityType,
    entity_id: Uuid,
    deps: &ServerDeps,
) -> Result<Option<OrganizationId>> {
    let org_id = match entity_type {
        ReportEntityType::Campaign => {
            Campaign::find_by_id_optional(CampaignId::from_uuid(entity_id), &deps.db_pool)
                .await?
                .map(|c| c.organization_id)
        }
        ReportEntityType::Organization => {
            Organization::find_by_id_optional(OrganizationId::from_uuid(entity_id), &deps.db_pool)
                .await?
                .map(|o| o.id)
        }
    };
    Ok(org_id)
}

fn entity_label(entity_type: ReportEntityType) -> &'static str {
    match entity_type {
        ReportEntityType::Campaign => "Campaign",
        ReportEntityType::Organization => "Organization",
    }
}

/// Only a resolved fraud report moves the score.
pub fn upholds_fraud(report_type: ReportType, resolution: ReportStatus) -> bool {
    report_type == ReportType::Fraud && resolution == ReportStatus::Resolved
}

pub async fn create_report(
    input: CreateReportInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Report> {
    let new = input.into_new_report(user.user_id)?;

    if target_organization(new.entity_type, new.entity_id, deps)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found(entity_label(new.entity_type)).into());
    }
    let report = Report::create(new, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::conflict("You already have an open report for this target"))?;
    info!(
        report_id = %report.id,
        entity_type = ?report.entity_type,
        entity_id = %report.entity_id,
        priority = ?report.priority,
        "Report filed"
    );
    Ok(report)
}

pub async fn my_reports(page: PageParams, user: &AuthUser, deps: &ServerDeps) -> Result<Paged<Report>> {
    let items =
        Report::find_for_reporter(user.user_id, page.limit(), page.offset(), &deps.db_pool).await?;
    let total = Report::count_for_reporter(user.user_id, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

pub async fn admin_list_reports(
    query: AdminReportQuery,
    page: PageParams,
    admin: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<Report>> {
    admin.actor().can(AdminCapability::HandleReports).check(deps).await?;
    let items = Report::find_filtered(
        query.status,
        query.priority,
        page.limit(),
        page.offset(),
        &deps.db_pool,
    )
    .await?;
    let total = Report::count_filtered(query.status, query.priority, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

pub async fn admin_get_report(id: ReportId, admin: &AuthUser, deps: &ServerDeps) -> Result<Report> {
    admin.actor().can(AdminCapability::HandleReports).check(deps).await?;
    let report = Report::find_by_id_optional(id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Report"))?;
    Ok(report)
}

pub async fn assign_report(
    id: ReportId,
    input: AssignReportInput,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<Report> {
    admin.actor().can(AdminCapability::HandleReports).check(deps).await?;

    let assignee = User::find_by_id_optional(input.assignee_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    if assignee.role != UserRole::Admin {
        return Err(ApiError::validation("assignee_id", "Reports can only be assigned to admins").into());
    }

    let report = admin_get_report(id, admin, deps).await?;
    if !report.status.is_open() {
        return Err(ApiError::bad_request("Closed reports cannot be assigned").into());
    }
    let assigned = Report::assign(id, assignee.id, input.priority, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::conflict("Report was closed concurrently"))?;

    info!(report_id = %id, assignee = %assignee.id, "Report assigned");
    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::ReportAssign)
            .entity_type("report")
            .entity_id(id.into_uuid())
            .old_values(json!({
                "status": report.status,
                "assigned_to": report.assigned_to,
                "priority": report.priority,
            }))
            .new_values(json!({
                "status": assigned.status,
                "assigned_to": assigned.assigned_to,
                "priority": assigned.priority,
            }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    Ok(assigned)
}

pub async fn resolve_report(
    id: ReportId,
    input: ResolveReportInput,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<Report> {
    admin.actor().can(AdminCapability::HandleReports).check(deps).await?;
    input.validate()?;

    let report = admin_get_report(id, admin, deps).await?;
    if !report.status.is_open() {
        return Err(ApiError::bad_request("Report is already closed").into());
    }
    let upheld_target = if upholds_fraud(report.report_type, input.resolution) {
        target_organization(report.entity_type, report.entity_id, deps).await?
    } else {
        None
    };

    let mut tx = deps.db_pool.begin().await?;
    let closed = Report::close(
        id,
        input.resolution,
        input.resolution_notes.trim(),
        admin.user_id,
        &mut tx,
    )
    .await?
    .ok_or_else(|| ApiError::conflict("Report was closed concurrently"))?;

    let mut score_event = None;
    if let Some(org_id) = upheld_target {
        let campaign_id = match closed.entity_type {
            ReportEntityType::Campaign => Some(CampaignId::from_uuid(closed.entity_id)),
            ReportEntityType::Organization => None,
        };
        transparency::activities::apply_event_in(
            org_id,
            ScoreEvent::ReportUpheld,
            campaign_id,
            None,
            &mut tx,
        )
        .await?;
        score_event = Some(ScoreEvent::ReportUpheld.as_str());
    }
    tx.commit().await?;

    info!(report_id = %id, resolution = ?closed.status, "Report closed");
    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::ReportResolve)
            .entity_type("report")
            .entity_id(id.into_uuid())
            .old_values(json!({ "status": report.status }))
            .new_values(json!({
                "status": closed.status,
                "resolution_notes": closed.resolution_notes,
                "score_event": score_event,
            }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    let verdict = match closed.status {
        ReportStatus::Resolved => "incelendi ve gerekli işlem yapıldı",
        _ => "incelendi ve kapatıldı",
    };
    notifications::notify(
        closed.reporter_id,
        NotificationType::ReportResolved,
        "Şikayetiniz sonuçlandı",
        &format!("Bildiriminiz {}.", verdict),
        Some(json!({ "report_id": id, "status": closed.status })),
        deps,
    )
    .await;

    Ok(closed)
}
