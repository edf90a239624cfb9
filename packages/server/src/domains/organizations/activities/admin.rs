//! Organization verification by admins

use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::common::{
    AdminCapability, ApiError, AuthUser, OrganizationId, PageParams, Paged, RequestMeta,
};
use crate::domains::audit::{self, AuditAction, AuditEntry};
use crate::domains::notifications::{self, NotificationType};
use crate::domains::organizations::activities::views::load_workspace;
use crate::domains::organizations::data::{
    AdminOrganizationQuery, FeaturedInput, OrganizationWorkspace, RejectOrganizationInput,
};
use crate::domains::organizations::models::{Organization, OrganizationDocument};
use crate::domains::transparency::activities as transparency;
use crate::kernel::ServerDeps;

async fn require_verifier(admin: &AuthUser, deps: &ServerDeps) -> Result<()> {
    admin
        .actor()
        .can(AdminCapability::VerifyOrganizations)
        .check(deps)
        .await?;
    Ok(())
}

async fn find(id: OrganizationId, deps: &ServerDeps) -> Result<Organization> {
    let org = Organization::find_by_id_optional(id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Organization"))?;
    Ok(org)
}

pub async fn list_organizations(
    query: AdminOrganizationQuery,
    page: PageParams,
    admin: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<Organization>> {
    require_verifier(admin, deps).await?;
    let items =
        Organization::find_by_status(query.status, page.limit(), page.offset(), &deps.db_pool)
            .await?;
    let total = Organization::count_by_status(query.status, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

pub async fn get_organization(
    id: OrganizationId,
    admin: &AuthUser,
    deps: &ServerDeps,
) -> Result<OrganizationWorkspace> {
    require_verifier(admin, deps).await?;
    let org = find(id, deps).await?;
    load_workspace(org, deps).await
}

/// Approves the organization and gives it its starting transparency score.
pub async fn verify_organization(
    id: OrganizationId,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<OrganizationWorkspace> {
    require_verifier(admin, deps).await?;
    let org = find(id, deps).await?;
    if !org.verification_status.is_reviewable() {
        return Err(ApiError::bad_request(format!(
            "Organization cannot be verified from status {}",
            org.verification_status
        ))
        .into());
    }

    let mut tx = deps.db_pool.begin().await?;
    let approved = Organization::approve(id, admin.user_id, &mut tx)
        .await?
        .ok_or_else(|| ApiError::conflict("Organization status changed, please retry"))?;
    OrganizationDocument::mark_all_verified(id, &mut tx).await?;
    transparency::initialize_score_in(id, &mut tx).await?;
    tx.commit().await?;

    info!(organization_id = %id, admin_id = %admin.user_id, "Organization verified");

    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::OrganizationVerify)
            .entity_type("organization")
            .entity_id(id.into_uuid())
            .old_values(json!({ "verification_status": org.verification_status }))
            .new_values(json!({ "verification_status": approved.verification_status }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;
    notifications::notify(
        approved.user_id,
        NotificationType::OrganizationVerified,
        "Kuruluşunuz doğrulandı",
        &format!("{} artık kampanya oluşturabilir.", approved.legal_name),
        Some(json!({ "organization_id": id })),
        deps,
    )
    .await;

    load_workspace(approved, deps).await
}

pub async fn reject_organization(
    id: OrganizationId,
    input: RejectOrganizationInput,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<OrganizationWorkspace> {
    require_verifier(admin, deps).await?;
    let reason = input.reason.trim();
    if reason.is_empty() {
        return Err(ApiError::validation("reason", "Rejection reason is required").into());
    }

    let org = find(id, deps).await?;
    if !org.verification_status.is_reviewable() {
        return Err(ApiError::bad_request(format!(
            "Organization cannot be rejected from status {}",
            org.verification_status
        ))
        .into());
    }
    let rejected = Organization::reject(id, reason, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::conflict("Organization status changed, please retry"))?;

    info!(organization_id = %id, admin_id = %admin.user_id, "Organization rejected");

    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::OrganizationReject)
            .entity_type("organization")
            .entity_id(id.into_uuid())
            .old_values(json!({ "verification_status": org.verification_status }))
            .new_values(json!({
                "verification_status": rejected.verification_status,
                "rejection_reason": reason,
            }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;
    notifications::notify(
        rejected.user_id,
        NotificationType::OrganizationRejected,
        "Kuruluş başvurunuz reddedildi",
        &format!("Gerekçe: {}", reason),
        Some(json!({ "organization_id": id })),
        deps,
    )
    .await;

    load_workspace(rejected, deps).await
}

pub async fn set_featured(
    id: OrganizationId,
    input: FeaturedInput,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<Organization> {
    require_verifier(admin, deps).await?;
    let org = find(id, deps).await?;
    if input.is_featured && !org.is_approved() {
        return Err(ApiError::bad_request("Only verified organizations can be featured").into());
    }
    let updated = Organization::set_featured(id, input.is_featured, &deps.db_pool).await?;

    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::OrganizationFeature)
            .entity_type("organization")
            .entity_id(id.into_uuid())
            .old_values(json!({ "is_featured": org.is_featured }))
            .new_values(json!({ "is_featured": updated.is_featured }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    Ok(updated)
}
