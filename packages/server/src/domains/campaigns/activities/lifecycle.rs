//! Scheduler-driven campaign lifecycle: completion on target or end date,
//! with up to two one-week extensions for campaigns that fell short.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::domains::campaigns::activities::manage::complete_by_system;
use crate::domains::campaigns::models::Campaign;
use crate::domains::notifications::{self, NotificationType};
use crate::domains::organizations::models::Organization;
use crate::kernel::ServerDeps;

pub const MAX_EXTENSIONS: i32 = 2;
pub const EXTENSION_DAYS: i64 = 7;

/// A campaign that reaches this share of its target by the end date is a success.
pub fn success_threshold(target: Decimal) -> Decimal {
    target * Decimal::new(8, 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueAction {
    Complete,
    Extend,
}

/// What to do with an ACTIVE campaign, or None when it is not due yet.
pub fn due_action(campaign: &Campaign, now: DateTime<Utc>) -> Option<DueAction> {
    if campaign.collected_amount >= campaign.target_amount {
        return Some(DueAction::Complete);
    }
    let ended = campaign.end_date.is_some_and(|end| end < now);
    if !ended {
        return None;
    }
    if campaign.collected_amount >= success_threshold(campaign.target_amount)
        || campaign.extension_count >= MAX_EXTENSIONS
    {
        Some(DueAction::Complete)
    } else {
        Some(DueAction::Extend)
    }
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct CampaignReviewStats {
    pub completed: usize,
    pub extended: usize,
    pub errors: usize,
}

pub async fn review_due_campaigns(deps: &ServerDeps) -> Result<CampaignReviewStats> {
    let now = Utc::now();
    let due = Campaign::find_due_for_review(now, &deps.db_pool).await?;
    let mut stats = CampaignReviewStats::default();

    for campaign in &due {
        match review_one(campaign, now, deps).await {
            Ok(Some(DueAction::Complete)) => stats.completed += 1,
            Ok(Some(DueAction::Extend)) => stats.extended += 1,
            Ok(None) => {}
            Err(e) => {
                stats.errors += 1;
                warn!(error = %e, campaign_id = %campaign.id, "Failed to review due campaign");
            }
        }
    }

    info!(
        due = due.len(),
        completed = stats.completed,
        extended = stats.extended,
        errors = stats.errors,
        "Campaign status review finished"
    );
    Ok(stats)
}

async fn review_one(
    campaign: &Campaign,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<Option<DueAction>> {
    let Some(action) = due_action(campaign, now) else {
        return Ok(None);
    };
    let org = Organization::find_by_id(campaign.organization_id, &deps.db_pool).await?;

    match action {
        DueAction::Complete => {
            let completed = complete_by_system(campaign, org.user_id, deps).await?;
            Ok(completed.map(|_| DueAction::Complete))
        }
        DueAction::Extend => {
            let Some(extended) = Campaign::extend_end_date(
                campaign.id,
                EXTENSION_DAYS,
                campaign.extension_count,
                MAX_EXTENSIONS,
                &deps.db_pool,
            )
            .await?
            else {
                return Ok(None);
            };
            info!(
                campaign_id = %campaign.id,
                extension = extended.extension_count,
                end_date = ?extended.end_date,
                "Campaign end date extended"
            );
            notifications::notify(
                org.user_id,
                NotificationType::CampaignUpdate,
                "Kampanya süresi uzatıldı",
                &format!(
                    "\"{}\" kampanyası hedefin %80'ine ulaşmadığı için {} gün uzatıldı ({}/{}).",
                    extended.title, EXTENSION_DAYS, extended.extension_count, MAX_EXTENSIONS
                ),
                Some(json!({ "campaign_id": extended.id, "end_date": extended.end_date })),
                deps,
            )
            .await;
            Ok(Some(DueAction::Extend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{CampaignId, OrganizationId, UserId};
    use crate::domains::campaigns::models::CampaignStatus;
    use chrono::Duration;
    use std::str::FromStr;

    fn campaign(collected: &str, end_in_days: i64, extensions: i32) -> Campaign {
        let now = Utc::now();
        Campaign {
            id: CampaignId::new(),
            organization_id: OrganizationId::new(),
            title: "Kışlık mont".to_string(),
            slug: "kislik-mont".to_string(),
            description: "Köy okulları için mont".to_string(),
            short_description: None,
            target_amount: Decimal::from(10_000),
            collected_amount: Decimal::from_str(collected).unwrap(),
            donor_count: 0,
            currency: "TRY".to_string(),
            status: CampaignStatus::Active,
            start_date: Some(now - Duration::days(30)),
            end_date: Some(now + Duration::days(end_in_days)),
            completed_at: None,
            cover_image_url: None,
            is_featured: false,
            is_urgent: false,
            evidence_deadline_days: 15,
            approved_at: Some(now - Duration::days(30)),
            approved_by: Some(UserId::new()),
            rejection_reason: None,
            created_by: UserId::new(),
            extension_count: extensions,
            beneficiary_count: None,
            location_city: None,
            evidence_penalty_applied_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn reaching_the_target_completes_early() {
        assert_eq!(
            due_action(&campaign("10000", 10, 0), Utc::now()),
            Some(DueAction::Complete)
        );
    }

    #[test]
    fn running_campaigns_below_target_are_left_alone() {
        assert_eq!(due_action(&campaign("500", 10, 0), Utc::now()), None);
    }

    #[test]
    fn eighty_percent_at_the_end_date_is_a_success() {
        assert_eq!(
            due_action(&campaign("8000", -1, 0), Utc::now()),
            Some(DueAction::Complete)
        );
        assert_eq!(
            due_action(&campaign("7999.99", -1, 0), Utc::now()),
            Some(DueAction::Extend)
        );
    }

    #[test]
    fn extensions_stop_after_two() {
        assert_eq!(
            due_action(&campaign("100", -1, 1), Utc::now()),
            Some(DueAction::Extend)
        );
        assert_eq!(
            due_action(&campaign("100", -1, MAX_EXTENSIONS), Utc::now()),
            Some(DueAction::Complete)
        );
    }
}
