//! Aid applications. Beneficiaries apply, admins review and route each
//! approved application to an organization, which links it to one of its
//! campaigns and finally marks it completed.

use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::common::{
    AdminCapability, ApiError, ApplicationDocumentId, ApplicationId, AuthUser, CategoryId,
    OrganizationId, PageParams, Paged, RequestMeta, UserRole,
};
use crate::domains::applications::data::{
    AdminApplicationQuery, ApplicationDetail, ApplicationStats, AssignCampaignInput,
    AssignOrganizationInput, CreateApplicationInput, DocumentInput, ReviewApplicationInput,
    UpdateApplicationInput, MAX_DOCUMENTS,
};
use crate::domains::applications::models::{
    Application, ApplicationDocument, ApplicationStatus,
};
use crate::domains::audit::{self, AuditAction, AuditEntry};
use crate::domains::campaigns::models::{Campaign, CampaignStatus, Category};
use crate::domains::notifications::{self, NotificationType};
use crate::domains::organizations::activities::require_own_organization;
use crate::domains::organizations::models::Organization;
use crate::kernel::ServerDeps;

const TOP_CITIES: i64 = 10;

async fn find_application(id: ApplicationId, deps: &ServerDeps) -> Result<Application> {
    let application = Application::find_by_id_optional(id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Application"))?;
    Ok(application)
}

/// The caller's own application. Admins read through the admin routes.
async fn find_own_application(
    id: ApplicationId,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Application> {
    let application = find_application(id, deps).await?;
    user.actor().require_strict_owner(application.applicant_id)?;
    Ok(application)
}

async fn check_category(id: Option<CategoryId>, deps: &ServerDeps) -> Result<()> {
    if let Some(id) = id {
        let active = Category::find_by_id_optional(id, &deps.db_pool)
            .await?
            .map_or(false, |c| c.is_active);
        if !active {
            return Err(ApiError::validation("category_id", "Unknown or inactive category").into());
        }
    }
    Ok(())
}

async fn approved_organization(id: OrganizationId, deps: &ServerDeps) -> Result<Organization> {
    let org = Organization::find_by_id_optional(id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Organization"))?;
    if !org.is_approved() {
        return Err(ApiError::validation(
            "organization_id",
            "Applications can only be routed to approved organizations",
        )
        .into());
    }
    Ok(org)
}

async fn load_detail(application: Application, deps: &ServerDeps) -> Result<ApplicationDetail> {
    let category_name = match application.category_id {
        Some(id) => Category::find_by_id_optional(id, &deps.db_pool)
            .await?
            .map(|c| c.name),
        None => None,
    };
    let documents = ApplicationDocument::find_for_application(application.id, &deps.db_pool).await?;
    Ok(ApplicationDetail {
        application,
        category_name,
        documents,
    })
}

fn status_label(status: ApplicationStatus) -> &'static str {
    match status {
        ApplicationStatus::Pending => "beklemede",
        ApplicationStatus::InReview => "incelemede",
        ApplicationStatus::Approved => "onaylandı",
        ApplicationStatus::Rejected => "reddedildi",
        ApplicationStatus::Completed => "tamamlandı",
    }
}

async fn notify_applicant(application: &Application, deps: &ServerDeps) {
    let mut message = format!(
        "\"{}\" başvurunuz {}.",
        application.title,
        status_label(application.status)
    );
    if let Some(reason) = &application.rejection_reason {
        message.push_str(&format!(" Gerekçe: {}", reason));
    }
    notifications::notify(
        application.applicant_id,
        NotificationType::System,
        "Başvurunuz güncellendi",
        &message,
        Some(json!({ "application_id": application.id, "status": application.status })),
        deps,
    )
    .await;
}

// =============================================================================
// Applicant
// =============================================================================

pub async fn create_application(
    input: CreateApplicationInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<ApplicationDetail> {
    if user.role != UserRole::Beneficiary {
        return Err(ApiError::forbidden("Only beneficiary accounts can apply for aid").into());
    }
    let (new, documents) = input.into_parts(user.user_id)?;
    check_category(new.category_id, deps).await?;

    let mut tx = deps.db_pool.begin().await?;
    let application = Application::create(new, &mut tx).await?;
    for document in &documents {
        ApplicationDocument::create(application.id, document, &mut tx).await?;
    }
    tx.commit().await?;

    info!(
        application_id = %application.id,
        urgency = application.urgency_level,
        documents = documents.len(),
        "Application submitted"
    );
    load_detail(application, deps).await
}

pub async fn my_applications(user: &AuthUser, deps: &ServerDeps) -> Result<Vec<Application>> {
    Application::find_for_applicant(user.user_id, &deps.db_pool).await
}

pub async fn my_application(
    id: ApplicationId,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<ApplicationDetail> {
    let application = find_own_application(id, user, deps).await?;
    load_detail(application, deps).await
}

pub async fn update_application(
    id: ApplicationId,
    input: UpdateApplicationInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Application> {
    find_own_application(id, user, deps).await?;
    let changes = input.into_changes()?;
    check_category(changes.category_id, deps).await?;
    let updated = Application::update_pending(id, changes, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::bad_request("Only pending applications can be updated"))?;
    Ok(updated)
}

pub async fn cancel_application(id: ApplicationId, user: &AuthUser, deps: &ServerDeps) -> Result<()> {
    find_own_application(id, user, deps).await?;
    if !Application::delete_pending(id, &deps.db_pool).await? {
        return Err(ApiError::bad_request("Only pending applications can be cancelled").into());
    }
    info!(application_id = %id, "Application withdrawn");
    Ok(())
}

pub async fn add_document(
    id: ApplicationId,
    input: DocumentInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<ApplicationDocument> {
    let application = find_own_application(id, user, deps).await?;
    if !application.status.is_routable() {
        return Err(ApiError::bad_request("Closed applications cannot take new documents").into());
    }
    let new = input.validate()?;

    let mut tx = deps.db_pool.begin().await?;
    Application::lock(id, &mut tx).await?;
    if ApplicationDocument::count_for_application(id, &mut tx).await? >= MAX_DOCUMENTS {
        return Err(ApiError::validation(
            "documents",
            format!("At most {} documents are allowed", MAX_DOCUMENTS),
        )
        .into());
    }
    let document = ApplicationDocument::create(id, &new, &mut tx).await?;
    tx.commit().await?;
    Ok(document)
}

pub async fn remove_document(
    id: ApplicationId,
    document_id: ApplicationDocumentId,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<()> {
    let application = find_own_application(id, user, deps).await?;
    if application.status != ApplicationStatus::Pending {
        return Err(
            ApiError::bad_request("Documents can only be removed from pending applications").into(),
        );
    }
    if !ApplicationDocument::delete(document_id, id, &deps.db_pool).await? {
        return Err(ApiError::not_found("Document").into());
    }
    Ok(())
}

// =============================================================================
// Organization
// =============================================================================

pub async fn assigned_applications(
    page: PageParams,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<Application>> {
    let org = require_own_organization(user, deps).await?;
    let items =
        Application::find_assigned(org.id, page.limit(), page.offset(), &deps.db_pool).await?;
    let total = Application::count_assigned(org.id, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

async fn find_assigned_application(
    id: ApplicationId,
    org: &Organization,
    deps: &ServerDeps,
) -> Result<Application> {
    let application = find_application(id, deps).await?;
    if application.assigned_organization_id != Some(org.id) {
        return Err(ApiError::forbidden("This application is not assigned to your organization").into());
    }
    if application.status != ApplicationStatus::Approved {
        return Err(ApiError::bad_request("Only approved applications can be processed").into());
    }
    Ok(application)
}

pub async fn assign_campaign(
    id: ApplicationId,
    input: AssignCampaignInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Application> {
    let org = require_own_organization(user, deps).await?;
    find_assigned_application(id, &org, deps).await?;
    let campaign = Campaign::find_by_id_optional(input.campaign_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Campaign"))?;
    if campaign.organization_id != org.id {
        return Err(ApiError::validation(
            "campaign_id",
            "The campaign must belong to your organization",
        )
        .into());
    }
    if campaign.status.is_terminal() || campaign.status == CampaignStatus::Rejected {
        return Err(ApiError::validation("campaign_id", "The campaign is closed").into());
    }
    let updated = Application::assign_campaign(id, org.id, campaign.id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::conflict("Application changed concurrently"))?;
    info!(application_id = %id, campaign_id = %campaign.id, "Application linked to campaign");
    Ok(updated)
}

pub async fn complete_application(
    id: ApplicationId,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Application> {
    let org = require_own_organization(user, deps).await?;
    find_assigned_application(id, &org, deps).await?;
    let completed = Application::complete(id, org.id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::conflict("Application changed concurrently"))?;
    info!(application_id = %id, organization_id = %org.id, "Application completed");
    notify_applicant(&completed, deps).await;
    Ok(completed)
}

// =============================================================================
// Admin
// =============================================================================

pub async fn admin_list_applications(
    query: AdminApplicationQuery,
    page: PageParams,
    admin: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<Application>> {
    admin.actor().can(AdminCapability::ReviewApplications).check(deps).await?;
    let city = query
        .city
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let items = Application::find_filtered(
        query.status,
        city,
        page.limit(),
        page.offset(),
        &deps.db_pool,
    )
    .await?;
    let total = Application::count_filtered(query.status, city, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

pub async fn admin_get_application(
    id: ApplicationId,
    admin: &AuthUser,
    deps: &ServerDeps,
) -> Result<ApplicationDetail> {
    admin.actor().can(AdminCapability::ReviewApplications).check(deps).await?;
    let application = find_application(id, deps).await?;
    load_detail(application, deps).await
}

pub async fn review_application(
    id: ApplicationId,
    input: ReviewApplicationInput,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<Application> {
    admin.actor().can(AdminCapability::ReviewApplications).check(deps).await?;
    let reason = input.validate()?;
    let application = find_application(id, deps).await?;
    if !application.status.can_review_to(input.status) {
        return Err(ApiError::bad_request("Invalid status transition").into());
    }
    if let Some(org_id) = input.assigned_organization_id {
        approved_organization(org_id, deps).await?;
    }

    let reviewed = Application::review(
        id,
        application.status,
        input.status,
        reason.as_deref(),
        input.assigned_organization_id,
        admin.user_id,
        &deps.db_pool,
    )
    .await?
    .ok_or_else(|| ApiError::conflict("Application changed concurrently"))?;

    info!(
        application_id = %id,
        from = ?application.status,
        to = ?reviewed.status,
        "Application reviewed"
    );
    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::ApplicationReview)
            .entity_type("application")
            .entity_id(id.into_uuid())
            .old_values(json!({ "status": application.status }))
            .new_values(json!({
                "status": reviewed.status,
                "rejection_reason": reviewed.rejection_reason,
                "assigned_organization_id": reviewed.assigned_organization_id,
            }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;
    notify_applicant(&reviewed, deps).await;

    Ok(reviewed)
}

pub async fn assign_organization(
    id: ApplicationId,
    input: AssignOrganizationInput,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<Application> {
    admin.actor().can(AdminCapability::ReviewApplications).check(deps).await?;
    let application = find_application(id, deps).await?;
    if !application.status.is_routable() {
        return Err(ApiError::bad_request("Closed applications cannot be reassigned").into());
    }
    let org = approved_organization(input.organization_id, deps).await?;
    let assigned = Application::assign_organization(id, org.id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::conflict("Application changed concurrently"))?;

    info!(application_id = %id, organization_id = %org.id, "Application routed");
    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::ApplicationAssign)
            .entity_type("application")
            .entity_id(id.into_uuid())
            .old_values(json!({ "assigned_organization_id": application.assigned_organization_id }))
            .new_values(json!({ "assigned_organization_id": org.id }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;
    notifications::notify(
        org.user_id,
        NotificationType::System,
        "Yeni yardım başvurusu",
        &format!("\"{}\" başvurusu kuruluşunuza yönlendirildi.", assigned.title),
        Some(json!({ "application_id": id })),
        deps,
    )
    .await;

    Ok(assigned)
}

pub async fn application_stats(admin: &AuthUser, deps: &ServerDeps) -> Result<ApplicationStats> {
    admin.actor().can(AdminCapability::ReviewApplications).check(deps).await?;
    let counts = Application::count_grouped_by_status(&deps.db_pool).await?;
    let by_city = Application::count_by_city(TOP_CITIES, &deps.db_pool).await?;
    Ok(ApplicationStats::from_counts(&counts, by_city))
}

pub async fn verify_document(
    id: ApplicationId,
    document_id: ApplicationDocumentId,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<ApplicationDocument> {
    admin.actor().can(AdminCapability::ReviewApplications).check(deps).await?;
    let document = ApplicationDocument::verify(document_id, id, admin.user_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Document"))?;
    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::ApplicationDocumentVerify)
            .entity_type("application_document")
            .entity_id(document_id.into_uuid())
            .new_values(json!({ "application_id": id, "is_verified": true }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;
    Ok(document)
}

