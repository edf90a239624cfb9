//! Owner-side campaign lifecycle

use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{info, warn};

use crate::common::utils::slug;
use crate::common::validation::{max_length, require_text};
use crate::common::{ApiError, AuthUser, CampaignId, CategoryId, PageParams, Paged, UserId};
use crate::domains::campaigns::activities::views::{find_owned_campaign, load_detail};
use crate::domains::campaigns::data::{
    CampaignDetail, CampaignStatusQuery, CreateCampaignInput, UpdateCampaignInput,
};
use crate::domains::campaigns::models::{
    Campaign, CampaignChanges, CampaignFollower, CampaignStatus, Category, FollowerTopic,
    NewCampaign,
};
use crate::domains::notifications::{self, NotificationType};
use crate::domains::organizations::activities::require_own_organization;
use crate::domains::organizations::models::Organization;
use crate::domains::transparency::activities as transparency;
use crate::domains::transparency::{ScoreEvent, TransparencyScore};
use crate::kernel::ServerDeps;

pub const DEFAULT_EVIDENCE_DEADLINE_DAYS: i32 = 15;
const MAX_EVIDENCE_DEADLINE_DAYS: i32 = 90;
const MAX_SLUG_ATTEMPTS: u32 = 50;

fn invalid_transition() -> ApiError {
    ApiError::bad_request("Invalid status transition")
}

fn validate_amount_and_dates(
    target_amount: Option<Decimal>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Result<(), ApiError> {
    if let Some(target) = target_amount {
        if target <= Decimal::ZERO {
            return Err(ApiError::validation(
                "target_amount",
                "Target amount must be greater than zero",
            ));
        }
    }
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(ApiError::validation(
                "end_date",
                "Start date must be before end date",
            ));
        }
    }
    Ok(())
}

fn validate_texts(
    title: Option<&str>,
    description: Option<&str>,
    short_description: Option<&str>,
) -> Result<(), ApiError> {
    if let Some(title) = title {
        require_text("title", title)?;
        max_length("title", Some(title), 200)?;
    }
    if let Some(description) = description {
        require_text("description", description)?;
    }
    max_length("short_description", short_description, 500)?;
    Ok(())
}

/// Picks the primary category: the requested one if it is linked, else the first.
fn resolve_primary(ids: &[CategoryId], requested: Option<CategoryId>) -> Option<CategoryId> {
    match requested {
        Some(id) if ids.contains(&id) => Some(id),
        _ => ids.first().copied(),
    }
}

async fn check_categories(ids: &[CategoryId], deps: &ServerDeps) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let mut unique = ids.to_vec();
    unique.sort();
    unique.dedup();
    if Category::count_active_among(&unique, &deps.db_pool).await? != unique.len() as i64 {
        return Err(ApiError::validation("category_ids", "Unknown or inactive category").into());
    }
    Ok(())
}

async fn unique_slug(title: &str, deps: &ServerDeps) -> Result<String> {
    let mut base = slug::slugify(title);
    if base.is_empty() {
        base = "kampanya".to_string();
    }
    for attempt in 0..MAX_SLUG_ATTEMPTS {
        let candidate = slug::candidate(&base, attempt);
        if !Campaign::slug_exists(&candidate, &deps.db_pool).await? {
            return Ok(candidate);
        }
    }
    Err(anyhow::anyhow!("Could not find a free slug for {}", base))
}

pub async fn create_campaign(
    input: CreateCampaignInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<CampaignDetail> {
    let org = Organization::find_by_user(user.user_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::forbidden("You need an organization to create campaigns"))?;
    if !org.is_approved() {
        return Err(ApiError::forbidden("Organization is not verified").into());
    }

    if TransparencyScore::find_by_organization(org.id, &deps.db_pool).await?.is_none() {
        transparency::initialize_score(org.id, deps).await?;
    }
    if !transparency::can_create_campaign(org.id, deps).await? {
        return Err(ApiError::bad_request(
            "Transparency score too low to create campaigns (minimum 40 required)",
        )
        .into());
    }

    validate_texts(
        Some(&input.title),
        Some(&input.description),
        input.short_description.as_deref(),
    )?;
    validate_amount_and_dates(Some(input.target_amount), input.start_date, input.end_date)?;
    let evidence_deadline_days = input
        .evidence_deadline_days
        .unwrap_or(DEFAULT_EVIDENCE_DEADLINE_DAYS);
    if !(1..=MAX_EVIDENCE_DEADLINE_DAYS).contains(&evidence_deadline_days) {
        return Err(ApiError::validation(
            "evidence_deadline_days",
            format!("Evidence deadline must be between 1 and {} days", MAX_EVIDENCE_DEADLINE_DAYS),
        )
        .into());
    }
    check_categories(&input.category_ids, deps).await?;

    let slug = unique_slug(&input.title, deps).await?;
    let primary = resolve_primary(&input.category_ids, input.primary_category_id);

    let mut tx = deps.db_pool.begin().await?;
    let campaign = Campaign::create(
        NewCampaign {
            organization_id: org.id,
            title: input.title.trim().to_string(),
            slug,
            description: input.description,
            short_description: input.short_description,
            target_amount: input.target_amount.round_dp(2),
            start_date: input.start_date,
            end_date: input.end_date,
            cover_image_url: input.cover_image_url,
            is_urgent: input.is_urgent,
            evidence_deadline_days,
            created_by: user.user_id,
            beneficiary_count: input.beneficiary_count,
            location_city: input.location_city,
        },
        &mut tx,
    )
    .await?;
    Category::link_to_campaign(campaign.id, &input.category_ids, primary, &mut tx).await?;
    TransparencyScore::increment_total_campaigns(org.id, &mut tx).await?;
    tx.commit().await?;

    info!(campaign_id = %campaign.id, organization_id = %org.id, slug = %campaign.slug, "Campaign created");
    load_detail(campaign, &org, Some(user), deps).await
}

pub async fn update_campaign(
    id: CampaignId,
    input: UpdateCampaignInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<CampaignDetail> {
    let (campaign, org) = find_owned_campaign(id, user, false, deps).await?;
    if campaign.status.is_terminal() {
        return Err(ApiError::bad_request("Cannot update a completed or cancelled campaign").into());
    }
    if input.target_amount.is_some() && !campaign.status.allows_financial_edits() {
        return Err(ApiError::bad_request(
            "Target amount can only change while the campaign is a draft or rejected",
        )
        .into());
    }

    validate_texts(
        input.title.as_deref(),
        input.description.as_deref(),
        input.short_description.as_deref(),
    )?;
    validate_amount_and_dates(
        input.target_amount,
        input.start_date.or(campaign.start_date),
        input.end_date.or(campaign.end_date),
    )?;
    if let Some(category_ids) = &input.category_ids {
        check_categories(category_ids, deps).await?;
    }

    let mut tx = deps.db_pool.begin().await?;
    let updated = Campaign::update(
        id,
        CampaignChanges {
            title: input.title.map(|t| t.trim().to_string()),
            description: input.description,
            short_description: input.short_description,
            target_amount: input.target_amount.map(|t| t.round_dp(2)),
            start_date: input.start_date,
            end_date: input.end_date,
            cover_image_url: input.cover_image_url,
            beneficiary_count: input.beneficiary_count,
            location_city: input.location_city,
        },
        &mut tx,
    )
    .await?;
    if let Some(category_ids) = input.category_ids {
        let primary = resolve_primary(&category_ids, input.primary_category_id);
        Category::link_to_campaign(id, &category_ids, primary, &mut tx).await?;
    }
    tx.commit().await?;

    load_detail(updated, &org, Some(user), deps).await
}

pub async fn delete_campaign(id: CampaignId, user: &AuthUser, deps: &ServerDeps) -> Result<()> {
    let (campaign, _) = find_owned_campaign(id, user, false, deps).await?;
    if campaign.status != CampaignStatus::Draft {
        return Err(ApiError::bad_request("Only draft campaigns can be deleted").into());
    }
    Campaign::delete(id, &deps.db_pool).await?;
    info!(campaign_id = %id, "Campaign deleted");
    Ok(())
}

/// Score event that accompanies a status change, if any. Cancelling a
/// campaign that was already collecting costs transparency points.
fn score_event(from: CampaignStatus, to: CampaignStatus) -> Option<ScoreEvent> {
    match (from, to) {
        (_, CampaignStatus::Completed) => Some(ScoreEvent::CampaignCompleted),
        (CampaignStatus::Active | CampaignStatus::Paused, CampaignStatus::Cancelled) => {
            Some(ScoreEvent::CampaignCancelled)
        }
        _ => None,
    }
}

/// Moves the campaign and applies its score event in one transaction.
async fn transition_scored(
    campaign: &Campaign,
    from: CampaignStatus,
    to: CampaignStatus,
    deps: &ServerDeps,
) -> Result<Option<Campaign>> {
    let mut tx = deps.db_pool.begin().await?;
    let Some(updated) = Campaign::transition(campaign.id, from, to, &mut tx).await? else {
        return Ok(None);
    };
    if let Some(event) = score_event(from, to) {
        transparency::apply_event_in(
            campaign.organization_id,
            event,
            Some(campaign.id),
            None,
            &mut tx,
        )
        .await?;
    }
    tx.commit().await?;
    Ok(Some(updated))
}

/// Owner-driven status change. Validates against the state machine and
/// performs a compare-and-set so concurrent changes lose cleanly.
async fn owner_transition(
    id: CampaignId,
    to: CampaignStatus,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<(Campaign, CampaignDetail)> {
    let (campaign, org) = find_owned_campaign(id, user, false, deps).await?;
    let from = campaign.status;
    if !from.can_transition_to(to) {
        return Err(invalid_transition().into());
    }

    let updated = transition_scored(&campaign, from, to, deps)
        .await?
        .ok_or_else(|| ApiError::conflict("Campaign status changed, please retry"))?;
    info!(campaign_id = %id, from = %from, to = %to, "Campaign status changed");

    let detail = load_detail(updated.clone(), &org, Some(user), deps).await?;
    Ok((updated, detail))
}

pub async fn submit_campaign(id: CampaignId, user: &AuthUser, deps: &ServerDeps) -> Result<CampaignDetail> {
    let (_, detail) = owner_transition(id, CampaignStatus::PendingApproval, user, deps).await?;
    Ok(detail)
}

pub async fn pause_campaign(id: CampaignId, user: &AuthUser, deps: &ServerDeps) -> Result<CampaignDetail> {
    let (_, detail) = owner_transition(id, CampaignStatus::Paused, user, deps).await?;
    Ok(detail)
}

pub async fn resume_campaign(id: CampaignId, user: &AuthUser, deps: &ServerDeps) -> Result<CampaignDetail> {
    let (_, detail) = owner_transition(id, CampaignStatus::Active, user, deps).await?;
    Ok(detail)
}

/// REJECTED back to DRAFT for another round.
pub async fn revise_campaign(id: CampaignId, user: &AuthUser, deps: &ServerDeps) -> Result<CampaignDetail> {
    let (_, detail) = owner_transition(id, CampaignStatus::Draft, user, deps).await?;
    Ok(detail)
}

pub async fn complete_campaign(id: CampaignId, user: &AuthUser, deps: &ServerDeps) -> Result<CampaignDetail> {
    let (campaign, detail) = owner_transition(id, CampaignStatus::Completed, user, deps).await?;
    announce_completion(&campaign, None, deps).await;
    Ok(detail)
}

pub async fn cancel_campaign(id: CampaignId, user: &AuthUser, deps: &ServerDeps) -> Result<CampaignDetail> {
    let (_, detail) = owner_transition(id, CampaignStatus::Cancelled, user, deps).await?;
    Ok(detail)
}

/// Scheduler path: ACTIVE to COMPLETED without an owner in the loop.
/// Returns `None` when the campaign was no longer active.
pub async fn complete_by_system(
    campaign: &Campaign,
    owner_id: UserId,
    deps: &ServerDeps,
) -> Result<Option<Campaign>> {
    let completed =
        transition_scored(campaign, CampaignStatus::Active, CampaignStatus::Completed, deps).await?;

    if let Some(ref completed) = completed {
        info!(campaign_id = %completed.id, collected = %completed.collected_amount, "Campaign completed automatically");
        announce_completion(completed, Some(owner_id), deps).await;
    }
    Ok(completed)
}

/// Owner and follower notifications. Failures are logged only.
async fn announce_completion(campaign: &Campaign, notify_owner: Option<UserId>, deps: &ServerDeps) {
    let data = json!({ "campaign_id": campaign.id, "slug": campaign.slug });
    let message = format!(
        "\"{}\" kampanyası {} TL toplayarak tamamlandı.",
        campaign.title, campaign.collected_amount
    );

    if let Some(owner_id) = notify_owner {
        notifications::notify(
            owner_id,
            NotificationType::CampaignCompleted,
            "Kampanyanız tamamlandı",
            &format!(
                "{} Harcama kanıtlarını {} gün içinde yükleyin.",
                message, campaign.evidence_deadline_days
            ),
            Some(data.clone()),
            deps,
        )
        .await;
    }

    match CampaignFollower::subscribed_ids(campaign.id, FollowerTopic::Completion, &deps.db_pool).await {
        Ok(followers) => {
            for follower in followers {
                notifications::notify(
                    follower,
                    NotificationType::CampaignCompleted,
                    "Takip ettiğiniz kampanya tamamlandı",
                    &message,
                    Some(data.clone()),
                    deps,
                )
                .await;
            }
        }
        Err(e) => warn!(error = %e, campaign_id = %campaign.id, "Failed to load campaign followers"),
    }
}

pub async fn my_campaigns(
    query: CampaignStatusQuery,
    page: PageParams,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<Campaign>> {
    let org = require_own_organization(user, deps).await?;
    let items = Campaign::find_for_organization(
        org.id,
        query.status,
        page.limit(),
        page.offset(),
        &deps.db_pool,
    )
    .await?;
    let total =
        Campaign::count_for_organization_filtered(org.id, query.status, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn target_must_be_positive() {
        assert!(validate_amount_and_dates(Some(Decimal::ZERO), None, None).is_err());
        assert!(validate_amount_and_dates(Some(Decimal::from(-5)), None, None).is_err());
        assert!(validate_amount_and_dates(Some(Decimal::from(1000)), None, None).is_ok());
    }

    #[test]
    fn start_date_must_not_follow_end_date() {
        let now = Utc::now();
        assert!(validate_amount_and_dates(None, Some(now), Some(now - Duration::days(1))).is_err());
        assert!(validate_amount_and_dates(None, Some(now), Some(now)).is_ok());
        assert!(validate_amount_and_dates(None, Some(now), None).is_ok());
    }

    #[test]
    fn title_is_required_and_bounded() {
        assert!(validate_texts(Some(" "), None, None).is_err());
        assert!(validate_texts(Some(&"a".repeat(201)), None, None).is_err());
        assert!(validate_texts(Some("Okul çantası"), Some("Açıklama"), None).is_ok());
        assert!(validate_texts(None, None, Some(&"a".repeat(501))).is_err());
    }

    #[test]
    fn only_completion_and_live_cancellation_move_the_score() {
        use CampaignStatus::*;
        assert_eq!(score_event(Active, Completed), Some(ScoreEvent::CampaignCompleted));
        assert_eq!(score_event(Active, Cancelled), Some(ScoreEvent::CampaignCancelled));
        assert_eq!(score_event(Paused, Cancelled), Some(ScoreEvent::CampaignCancelled));
        assert_eq!(score_event(Draft, Cancelled), None);
        assert_eq!(score_event(PendingApproval, Cancelled), None);
        assert_eq!(score_event(Active, Paused), None);
    }

    #[test]
    fn primary_category_falls_back_to_first_linked() {
        let a = CategoryId::new();
        let b = CategoryId::new();
        assert_eq!(resolve_primary(&[a, b], Some(b)), Some(b));
        assert_eq!(resolve_primary(&[a, b], Some(CategoryId::new())), Some(a));
        assert_eq!(resolve_primary(&[], Some(a)), None);
    }
}
