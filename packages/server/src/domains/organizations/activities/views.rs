use anyhow::Result;

use crate::common::UserId;
use crate::domains::campaigns::models::Campaign;
use crate::domains::organizations::data::{OrganizationDetail, OrganizationWorkspace};
use crate::domains::organizations::models::{
    BankAccount, FavoriteOrganization, Organization, OrganizationContact, OrganizationDocument,
};
use crate::domains::transparency::calculator;
use crate::domains::transparency::TransparencyScore;
use crate::kernel::ServerDeps;

/// Joins the score summary and active campaign count onto an organization.
/// `viewer` adds the favorite flag for signed-in callers.
pub async fn load_detail(
    organization: Organization,
    viewer: Option<UserId>,
    deps: &ServerDeps,
) -> Result<OrganizationDetail> {
    let score = TransparencyScore::find_by_organization(organization.id, &deps.db_pool).await?;
    let active_campaign_count =
        Campaign::count_active_for_organization(organization.id, &deps.db_pool).await?;
    let is_favorite = match viewer {
        Some(user_id) => {
            Some(FavoriteOrganization::is_favorite(user_id, organization.id, &deps.db_pool).await?)
        }
        None => None,
    };

    Ok(OrganizationDetail {
        transparency_score: score.as_ref().map(|s| s.current_score),
        transparency_level: score.as_ref().map(|s| calculator::level(s.current_score)),
        active_campaign_count,
        is_favorite,
        organization,
    })
}

pub async fn load_workspace(
    organization: Organization,
    deps: &ServerDeps,
) -> Result<OrganizationWorkspace> {
    let id = organization.id;
    let detail = load_detail(organization, None, deps).await?;
    Ok(OrganizationWorkspace {
        detail,
        contacts: OrganizationContact::find_for_organization(id, &deps.db_pool).await?,
        bank_accounts: BankAccount::find_for_organization(id, &deps.db_pool).await?,
        documents: OrganizationDocument::find_for_organization(id, &deps.db_pool).await?,
    })
}
