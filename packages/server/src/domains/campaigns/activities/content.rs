//! Progress updates and the photo gallery on a campaign page

use anyhow::Result;
use serde_json::json;
use tracing::{info, warn};

use crate::common::{
    ApiError, AuthUser, CampaignId, CampaignImageId, CampaignUpdateId, PageParams, Paged,
};
use crate::domains::campaigns::activities::views::{
    ensure_visible, find_campaign, find_owned_campaign,
};
use crate::domains::campaigns::data::{
    check_reorder, AddCampaignImageInput, CreateCampaignUpdateInput, ReorderImagesInput,
    MAX_CAMPAIGN_IMAGES,
};
use crate::domains::campaigns::models::{
    Campaign, CampaignFollower, CampaignImage, CampaignStatus, CampaignUpdate, FollowerTopic,
};
use crate::domains::notifications::{self, NotificationType};
use crate::domains::organizations::models::Organization;
use crate::kernel::ServerDeps;

async fn find_visible(
    id: CampaignId,
    viewer: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<Campaign> {
    let campaign = find_campaign(id, deps).await?;
    let org = Organization::find_by_id(campaign.organization_id, &deps.db_pool).await?;
    ensure_visible(&campaign, &org, viewer)?;
    Ok(campaign)
}

/// Drafts and campaigns under review have nobody to tell yet.
fn accepts_updates(status: CampaignStatus) -> bool {
    matches!(
        status,
        CampaignStatus::Active | CampaignStatus::Paused | CampaignStatus::Completed
    )
}

pub async fn list_updates(
    id: CampaignId,
    page: PageParams,
    viewer: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<Paged<CampaignUpdate>> {
    let campaign = find_visible(id, viewer, deps).await?;
    let items =
        CampaignUpdate::find_for_campaign(campaign.id, page.limit(), page.offset(), &deps.db_pool)
            .await?;
    let total = CampaignUpdate::count_for_campaign(campaign.id, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

pub async fn post_update(
    id: CampaignId,
    input: CreateCampaignUpdateInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<CampaignUpdate> {
    let (campaign, _) = find_owned_campaign(id, user, false, deps).await?;
    if !accepts_updates(campaign.status) {
        return Err(ApiError::bad_request("Updates can only be posted on published campaigns").into());
    }
    let new = input.into_new(campaign.id, user.user_id)?;
    let update = CampaignUpdate::create(new, &deps.db_pool).await?;
    info!(campaign_id = %campaign.id, update_id = %update.id, "Campaign update posted");

    match CampaignFollower::subscribed_ids(campaign.id, FollowerTopic::Update, &deps.db_pool).await {
        Ok(followers) => {
            let message = format!("{}: {}", campaign.title, update.title);
            let data = json!({ "campaign_id": campaign.id, "update_id": update.id });
            for follower in followers {
                notifications::notify(
                    follower,
                    NotificationType::CampaignUpdate,
                    "Takip ettiğiniz kampanyada yeni gelişme",
                    &message,
                    Some(data.clone()),
                    deps,
                )
                .await;
            }
        }
        Err(e) => warn!(error = %e, campaign_id = %campaign.id, "Failed to load campaign followers"),
    }

    Ok(update)
}

/// Owner or admin.
pub async fn delete_update(
    id: CampaignId,
    update_id: CampaignUpdateId,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<()> {
    let (campaign, _) = find_owned_campaign(id, user, true, deps).await?;
    if !CampaignUpdate::delete(update_id, campaign.id, &deps.db_pool).await? {
        return Err(ApiError::not_found("Campaign update").into());
    }
    info!(campaign_id = %campaign.id, update_id = %update_id, "Campaign update deleted");
    Ok(())
}

pub async fn list_images(
    id: CampaignId,
    viewer: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<Vec<CampaignImage>> {
    let campaign = find_visible(id, viewer, deps).await?;
    CampaignImage::find_for_campaign(campaign.id, &deps.db_pool).await
}

pub async fn add_image(
    id: CampaignId,
    input: AddCampaignImageInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<CampaignImage> {
    let (campaign, _) = find_owned_campaign(id, user, false, deps).await?;
    if campaign.status.is_terminal() {
        return Err(ApiError::bad_request("Closed campaigns cannot be changed").into());
    }
    let new = input.validate()?;

    let mut tx = deps.db_pool.begin().await?;
    Campaign::lock(campaign.id, &mut tx).await?;
    let existing = CampaignImage::ids_for_campaign(campaign.id, &mut tx).await?;
    if existing.len() >= MAX_CAMPAIGN_IMAGES {
        return Err(ApiError::validation(
            "image_url",
            format!("A campaign can have at most {} images", MAX_CAMPAIGN_IMAGES),
        )
        .into());
    }
    let image = CampaignImage::create(campaign.id, &new, &mut tx).await?;
    tx.commit().await?;
    Ok(image)
}

pub async fn delete_image(
    id: CampaignId,
    image_id: CampaignImageId,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<()> {
    let (campaign, _) = find_owned_campaign(id, user, true, deps).await?;
    if !CampaignImage::delete(image_id, campaign.id, &deps.db_pool).await? {
        return Err(ApiError::not_found("Campaign image").into());
    }
    Ok(())
}

pub async fn reorder_images(
    id: CampaignId,
    input: ReorderImagesInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Vec<CampaignImage>> {
    let (campaign, _) = find_owned_campaign(id, user, false, deps).await?;

    let mut tx = deps.db_pool.begin().await?;
    Campaign::lock(campaign.id, &mut tx).await?;
    let current = CampaignImage::ids_for_campaign(campaign.id, &mut tx).await?;
    check_reorder(&current, &input.image_ids)?;
    CampaignImage::reorder(campaign.id, &input.image_ids, &mut tx).await?;
    tx.commit().await?;

    CampaignImage::find_for_campaign(campaign.id, &deps.db_pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_published_campaigns_take_updates() {
        assert!(accepts_updates(CampaignStatus::Active));
        assert!(accepts_updates(CampaignStatus::Completed));
        assert!(!accepts_updates(CampaignStatus::Draft));
        assert!(!accepts_updates(CampaignStatus::PendingApproval));
        assert!(!accepts_updates(CampaignStatus::Cancelled));
    }
}
