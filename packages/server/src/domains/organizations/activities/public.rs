//! Public directory and favorites

use anyhow::Result;

use crate::common::{ApiError, AuthUser, OrganizationId, PageParams, Paged};
use crate::domains::organizations::activities::views::load_detail;
use crate::domains::organizations::data::{OrganizationDetail, OrganizationListQuery};
use crate::domains::organizations::models::{FavoriteOrganization, Organization};
use crate::kernel::ServerDeps;

pub async fn list_organizations(
    query: OrganizationListQuery,
    page: PageParams,
    deps: &ServerDeps,
) -> Result<Paged<Organization>> {
    let q = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let items = Organization::search_public(
        q,
        query.organization_type,
        page.limit(),
        page.offset(),
        &deps.db_pool,
    )
    .await?;
    let total = Organization::count_public(q, query.organization_type, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

/// Approved organizations are public; others only to their owner and admins.
pub async fn get_organization(
    id: OrganizationId,
    viewer: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<OrganizationDetail> {
    let org = Organization::find_by_id_optional(id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Organization"))?;

    if !org.is_approved() {
        let allowed = viewer.map_or(false, |v| v.actor().require_owner(org.user_id).is_ok());
        if !allowed {
            return Err(ApiError::not_found("Organization").into());
        }
    }

    load_detail(org, viewer.map(|v| v.user_id), deps).await
}

async fn require_approved(id: OrganizationId, deps: &ServerDeps) -> Result<Organization> {
    let org = Organization::find_by_id_optional(id, &deps.db_pool)
        .await?
        .filter(Organization::is_approved)
        .ok_or_else(|| ApiError::not_found("Organization"))?;
    Ok(org)
}

pub async fn add_favorite(id: OrganizationId, user: &AuthUser, deps: &ServerDeps) -> Result<()> {
    require_approved(id, deps).await?;
    FavoriteOrganization::add(user.user_id, id, &deps.db_pool).await
}

pub async fn remove_favorite(id: OrganizationId, user: &AuthUser, deps: &ServerDeps) -> Result<()> {
    FavoriteOrganization::remove(user.user_id, id, &deps.db_pool).await
}

pub async fn my_favorites(
    page: PageParams,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<Organization>> {
    let items = FavoriteOrganization::organizations_for_user(
        user.user_id,
        page.limit(),
        page.offset(),
        &deps.db_pool,
    )
    .await?;
    let total = FavoriteOrganization::count_for_user(user.user_id, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}
