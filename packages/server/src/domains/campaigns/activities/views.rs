use anyhow::Result;

use crate::common::{ApiError, AuthUser, CampaignId};
use crate::domains::campaigns::data::{progress_percent, CampaignDetail};
use crate::domains::campaigns::models::{Campaign, CampaignFollower, Category};
use crate::domains::organizations::models::Organization;
use crate::kernel::ServerDeps;

pub async fn find_campaign(id: CampaignId, deps: &ServerDeps) -> Result<Campaign> {
    let campaign = Campaign::find_by_id_optional(id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Campaign"))?;
    Ok(campaign)
}

/// Loads the campaign and its organization, failing unless `user` owns it.
/// Admins pass only when `allow_admin` is set.
pub async fn find_owned_campaign(
    id: CampaignId,
    user: &AuthUser,
    allow_admin: bool,
    deps: &ServerDeps,
) -> Result<(Campaign, Organization)> {
    let campaign = find_campaign(id, deps).await?;
    let org = Organization::find_by_id(campaign.organization_id, &deps.db_pool).await?;
    let actor = user.actor();
    if allow_admin {
        actor.require_owner(org.user_id)?;
    } else {
        actor.require_strict_owner(org.user_id)?;
    }
    Ok((campaign, org))
}

/// Non-public campaigns look missing to everyone but the owner and admins.
pub fn ensure_visible(
    campaign: &Campaign,
    org: &Organization,
    viewer: Option<&AuthUser>,
) -> Result<()> {
    if campaign.status.is_public() {
        return Ok(());
    }
    let allowed = viewer.map_or(false, |v| v.actor().require_owner(org.user_id).is_ok());
    if !allowed {
        return Err(ApiError::not_found("Campaign").into());
    }
    Ok(())
}

pub async fn load_detail(
    campaign: Campaign,
    org: &Organization,
    viewer: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<CampaignDetail> {
    let categories = Category::for_campaign(campaign.id, &deps.db_pool).await?;
    let is_following = match viewer {
        Some(user) => {
            Some(CampaignFollower::is_following(user.user_id, campaign.id, &deps.db_pool).await?)
        }
        None => None,
    };
    Ok(CampaignDetail {
        progress_percent: progress_percent(campaign.collected_amount, campaign.target_amount),
        organization_name: org.legal_name.clone(),
        organization_logo_url: org.logo_url.clone(),
        categories,
        is_following,
        campaign,
    })
}
