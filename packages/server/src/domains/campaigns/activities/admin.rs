//! Campaign moderation and category management

use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::common::utils::slug::slugify;
use crate::common::validation::{max_length, require_text};
use crate::common::{
    AdminCapability, ApiError, AuthUser, CampaignId, CategoryId, PageParams, Paged, RequestMeta,
};
use crate::domains::audit::{self, AuditAction, AuditEntry};
use crate::domains::campaigns::activities::views::find_campaign;
use crate::domains::campaigns::data::{
    CampaignFlagsInput, CampaignStatusQuery, CreateCategoryInput, RejectCampaignInput,
    UpdateCategoryInput,
};
use crate::domains::campaigns::models::{Campaign, CampaignStatus, Category, CategoryChanges};
use crate::domains::notifications::{self, NotificationType};
use crate::domains::organizations::models::Organization;
use crate::kernel::ServerDeps;

async fn require_moderator(admin: &AuthUser, deps: &ServerDeps) -> Result<()> {
    admin
        .actor()
        .can(AdminCapability::ApproveCampaigns)
        .check(deps)
        .await?;
    Ok(())
}

pub async fn list_campaigns(
    query: CampaignStatusQuery,
    page: PageParams,
    admin: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<Campaign>> {
    require_moderator(admin, deps).await?;
    let items =
        Campaign::find_by_status(query.status, page.limit(), page.offset(), &deps.db_pool).await?;
    let total = Campaign::count_by_status(query.status, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

pub async fn approve_campaign(
    id: CampaignId,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<Campaign> {
    require_moderator(admin, deps).await?;
    let campaign = find_campaign(id, deps).await?;
    if campaign.status != CampaignStatus::PendingApproval {
        return Err(ApiError::bad_request("Campaign is not pending approval").into());
    }
    let approved = Campaign::approve(id, admin.user_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::conflict("Campaign status changed, please retry"))?;

    info!(campaign_id = %id, admin_id = %admin.user_id, "Campaign approved");

    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::CampaignApprove)
            .entity_type("campaign")
            .entity_id(id.into_uuid())
            .old_values(json!({ "status": campaign.status }))
            .new_values(json!({ "status": approved.status }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    let org = Organization::find_by_id(approved.organization_id, &deps.db_pool).await?;
    notifications::notify(
        org.user_id,
        NotificationType::CampaignApproved,
        "Kampanyanız onaylandı",
        &format!("\"{}\" kampanyası yayında.", approved.title),
        Some(json!({ "campaign_id": id, "slug": approved.slug })),
        deps,
    )
    .await;

    Ok(approved)
}

pub async fn reject_campaign(
    id: CampaignId,
    input: RejectCampaignInput,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<Campaign> {
    require_moderator(admin, deps).await?;
    let reason = input.reason.trim();
    if reason.is_empty() {
        return Err(ApiError::validation("reason", "Rejection reason is required").into());
    }
    let campaign = find_campaign(id, deps).await?;
    if campaign.status != CampaignStatus::PendingApproval {
        return Err(ApiError::bad_request("Campaign is not pending approval").into());
    }
    let rejected = Campaign::reject(id, reason, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::conflict("Campaign status changed, please retry"))?;

    info!(campaign_id = %id, admin_id = %admin.user_id, "Campaign rejected");

    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::CampaignReject)
            .entity_type("campaign")
            .entity_id(id.into_uuid())
            .old_values(json!({ "status": campaign.status }))
            .new_values(json!({ "status": rejected.status, "rejection_reason": reason }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    let org = Organization::find_by_id(rejected.organization_id, &deps.db_pool).await?;
    notifications::notify(
        org.user_id,
        NotificationType::CampaignRejected,
        "Kampanyanız reddedildi",
        &format!("\"{}\" reddedildi. Gerekçe: {}", rejected.title, reason),
        Some(json!({ "campaign_id": id })),
        deps,
    )
    .await;

    Ok(rejected)
}

pub async fn set_flags(
    id: CampaignId,
    input: CampaignFlagsInput,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<Campaign> {
    require_moderator(admin, deps).await?;
    let campaign = find_campaign(id, deps).await?;
    let updated = Campaign::set_flags(id, input.is_featured, input.is_urgent, &deps.db_pool).await?;

    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::CampaignFlagsUpdate)
            .entity_type("campaign")
            .entity_id(id.into_uuid())
            .old_values(json!({ "is_featured": campaign.is_featured, "is_urgent": campaign.is_urgent }))
            .new_values(json!({ "is_featured": updated.is_featured, "is_urgent": updated.is_urgent }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    Ok(updated)
}

// =============================================================================
// Categories
// =============================================================================

fn category_slug(explicit: Option<&str>, name: &str) -> Result<String, ApiError> {
    let slug = slugify(explicit.unwrap_or(name));
    if slug.is_empty() {
        return Err(ApiError::validation("slug", "Slug cannot be empty"));
    }
    Ok(slug)
}

pub async fn create_category(
    input: CreateCategoryInput,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<Category> {
    require_moderator(admin, deps).await?;
    require_text("name", &input.name)?;
    max_length("name", Some(&input.name), 100)?;
    let slug = category_slug(input.slug.as_deref(), &input.name)?;
    if Category::slug_taken(&slug, None, &deps.db_pool).await? {
        return Err(ApiError::conflict("Category slug already exists").into());
    }

    let category = Category::create(
        input.name.trim(),
        &slug,
        input.description.as_deref(),
        input.icon.as_deref(),
        input.display_order.unwrap_or(0),
        &deps.db_pool,
    )
    .await?;

    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::CategoryCreate)
            .entity_type("category")
            .entity_id(category.id.into_uuid())
            .new_values(json!({ "name": category.name, "slug": category.slug }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    Ok(category)
}

pub async fn update_category(
    id: CategoryId,
    input: UpdateCategoryInput,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<Category> {
    require_moderator(admin, deps).await?;
    let current = Category::find_by_id_optional(id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Category"))?;

    if let Some(name) = input.name.as_deref() {
        require_text("name", name)?;
        max_length("name", Some(name), 100)?;
    }
    let slug = match input.slug.as_deref() {
        Some(raw) => {
            let slug = category_slug(Some(raw), &current.name)?;
            if Category::slug_taken(&slug, Some(id), &deps.db_pool).await? {
                return Err(ApiError::conflict("Category slug already exists").into());
            }
            Some(slug)
        }
        None => None,
    };

    let updated = Category::update(
        id,
        CategoryChanges {
            name: input.name.map(|n| n.trim().to_string()),
            slug,
            description: input.description,
            icon: input.icon,
            display_order: input.display_order,
            is_active: input.is_active,
        },
        &deps.db_pool,
    )
    .await?;

    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::CategoryUpdate)
            .entity_type("category")
            .entity_id(id.into_uuid())
            .old_values(json!({ "name": current.name, "slug": current.slug, "is_active": current.is_active }))
            .new_values(json!({ "name": updated.name, "slug": updated.slug, "is_active": updated.is_active }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    Ok(updated)
}

/// Categories are never hard-deleted; campaigns keep their links.
pub async fn deactivate_category(
    id: CategoryId,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<Category> {
    require_moderator(admin, deps).await?;
    let category = Category::deactivate(id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Category"))?;

    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::CategoryDeactivate)
            .entity_type("category")
            .entity_id(id.into_uuid())
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    Ok(category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_slug_comes_from_name_when_missing() {
        assert_eq!(category_slug(None, "Afet Yardımı").unwrap(), "afet-yardimi");
        assert_eq!(category_slug(Some("Özel Eğitim"), "ignored").unwrap(), "ozel-egitim");
        assert!(category_slug(None, "!!!").is_err());
    }
}
