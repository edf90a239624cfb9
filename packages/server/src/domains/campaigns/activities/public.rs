//! Public campaign discovery, stats and following

use anyhow::Result;
use chrono::Utc;

use crate::common::{ApiError, AuthUser, CampaignId, PageParams, Paged};
use crate::domains::campaigns::activities::views::{ensure_visible, find_campaign, load_detail};
use crate::domains::campaigns::data::{
    days_remaining, progress_percent, CampaignDetail, CampaignListQuery, CampaignStats,
};
use crate::domains::campaigns::models::{
    Campaign, CampaignFollower, CampaignStatus, Category, PublicCampaignFilter,
};
use crate::domains::evidence::models::Evidence;
use crate::domains::organizations::models::Organization;
use crate::kernel::ServerDeps;

const HIGHLIGHT_LIMIT: i64 = 10;

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn list_campaigns(
    query: CampaignListQuery,
    page: PageParams,
    deps: &ServerDeps,
) -> Result<Paged<Campaign>> {
    let filter = PublicCampaignFilter {
        query: non_blank(query.q),
        category_slug: non_blank(query.category),
        city: non_blank(query.city),
        urgent: query.urgent,
        featured: query.featured,
        sort: query.sort,
    };
    let items = Campaign::search_public(&filter, page.limit(), page.offset(), &deps.db_pool).await?;
    let total = Campaign::count_public(&filter, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

async fn detail_for(
    campaign: Campaign,
    viewer: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<CampaignDetail> {
    let org = Organization::find_by_id(campaign.organization_id, &deps.db_pool).await?;
    ensure_visible(&campaign, &org, viewer)?;
    load_detail(campaign, &org, viewer, deps).await
}

pub async fn get_campaign(
    id: CampaignId,
    viewer: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<CampaignDetail> {
    let campaign = find_campaign(id, deps).await?;
    detail_for(campaign, viewer, deps).await
}

pub async fn get_campaign_by_slug(
    slug: &str,
    viewer: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<CampaignDetail> {
    let campaign = Campaign::find_by_slug(slug, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Campaign"))?;
    detail_for(campaign, viewer, deps).await
}

pub async fn featured_campaigns(deps: &ServerDeps) -> Result<Vec<Campaign>> {
    Campaign::find_featured(HIGHLIGHT_LIMIT, &deps.db_pool).await
}

pub async fn urgent_campaigns(deps: &ServerDeps) -> Result<Vec<Campaign>> {
    Campaign::find_urgent(HIGHLIGHT_LIMIT, &deps.db_pool).await
}

pub async fn campaign_stats(
    id: CampaignId,
    viewer: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<CampaignStats> {
    let campaign = find_campaign(id, deps).await?;
    let org = Organization::find_by_id(campaign.organization_id, &deps.db_pool).await?;
    ensure_visible(&campaign, &org, viewer)?;

    let approved_evidence_total = Evidence::approved_total(id, &deps.db_pool).await?;
    let follower_count = CampaignFollower::count_for_campaign(id, &deps.db_pool).await?;
    let remaining = if campaign.status == CampaignStatus::Active || campaign.status == CampaignStatus::Paused {
        days_remaining(campaign.end_date, Utc::now())
    } else {
        Some(0)
    };

    Ok(CampaignStats {
        progress_percent: progress_percent(campaign.collected_amount, campaign.target_amount),
        collected_amount: campaign.collected_amount,
        target_amount: campaign.target_amount,
        donor_count: campaign.donor_count,
        follower_count,
        days_remaining: remaining,
        approved_evidence_total,
    })
}

pub async fn list_categories(deps: &ServerDeps) -> Result<Vec<Category>> {
    Category::find_active(&deps.db_pool).await
}

pub async fn follow_campaign(id: CampaignId, user: &AuthUser, deps: &ServerDeps) -> Result<()> {
    let campaign = find_campaign(id, deps).await?;
    if !campaign.status.is_public() {
        return Err(ApiError::not_found("Campaign").into());
    }
    CampaignFollower::follow(user.user_id, id, &deps.db_pool).await
}

pub async fn unfollow_campaign(id: CampaignId, user: &AuthUser, deps: &ServerDeps) -> Result<()> {
    CampaignFollower::unfollow(user.user_id, id, &deps.db_pool).await
}

pub async fn followed_campaigns(
    page: PageParams,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<Campaign>> {
    let items = Campaign::followed_by(user.user_id, page.limit(), page.offset(), &deps.db_pool).await?;
    let total = CampaignFollower::count_for_user(user.user_id, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}
