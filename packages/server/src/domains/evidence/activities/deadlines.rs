//! Scheduled follow-up on campaigns that still owe spending evidence.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{info, warn};

use crate::domains::campaigns::data::days_remaining;
use crate::domains::campaigns::models::Campaign;
use crate::domains::evidence::data::REMINDER_DAYS;
use crate::domains::evidence::models::Evidence;
use crate::domains::notifications::{self, NotificationType};
use crate::domains::organizations::models::Organization;
use crate::domains::transparency::{self, ScoreEvent};
use crate::kernel::ServerDeps;

/// Whole days left until the campaign's evidence deadline, if it has one.
pub fn days_to_deadline(campaign: &Campaign, now: DateTime<Utc>) -> Option<i64> {
    days_remaining(campaign.evidence_deadline(), now)
}

pub fn is_reminder_day(days_left: i64) -> bool {
    REMINDER_DAYS.contains(&days_left)
}

fn owes_evidence(campaign: &Campaign, approved_total: Decimal) -> bool {
    approved_total < campaign.collected_amount
}

/// Reminds owners 7, 3 and 1 days before the deadline. Returns the number
/// of reminders sent.
pub async fn send_evidence_reminders(deps: &ServerDeps) -> Result<usize> {
    let now = Utc::now();
    let mut sent = 0;

    for campaign in Campaign::find_completed_without_penalty(&deps.db_pool).await? {
        let Some(days_left) = days_to_deadline(&campaign, now) else {
            continue;
        };
        if !is_reminder_day(days_left) {
            continue;
        }
        match remind(&campaign, days_left, deps).await {
            Ok(true) => sent += 1,
            Ok(false) => {}
            Err(e) => warn!(error = %e, campaign_id = %campaign.id, "Evidence reminder failed"),
        }
    }
    Ok(sent)
}

async fn remind(campaign: &Campaign, days_left: i64, deps: &ServerDeps) -> Result<bool> {
    let approved = Evidence::approved_total(campaign.id, &deps.db_pool).await?;
    if !owes_evidence(campaign, approved) {
        return Ok(false);
    }
    let org = Organization::find_by_id(campaign.organization_id, &deps.db_pool).await?;
    notifications::notify(
        org.user_id,
        NotificationType::EvidenceRequired,
        "Harcama kanıtı bekleniyor",
        &format!(
            "\"{}\" kampanyası için harcama kanıtı yüklemek üzere {} gününüz kaldı.",
            campaign.title, days_left
        ),
        Some(json!({
            "campaign_id": campaign.id,
            "days_left": days_left,
            "collected_amount": campaign.collected_amount,
            "approved_total": approved,
        })),
        deps,
    )
    .await;
    Ok(true)
}

/// Applies EVIDENCE_DEADLINE_MISSED once per campaign whose deadline passed
/// without enough approved evidence. Returns the number of penalties.
pub async fn apply_deadline_penalties(deps: &ServerDeps) -> Result<usize> {
    let now = Utc::now();
    let mut applied = 0;

    for campaign in Campaign::find_completed_without_penalty(&deps.db_pool).await? {
        let past_deadline = campaign.evidence_deadline().is_some_and(|d| d < now);
        if !past_deadline {
            continue;
        }
        match penalize(&campaign, deps).await {
            Ok(true) => applied += 1,
            Ok(false) => {}
            Err(e) => warn!(error = %e, campaign_id = %campaign.id, "Evidence penalty failed"),
        }
    }
    Ok(applied)
}

async fn penalize(campaign: &Campaign, deps: &ServerDeps) -> Result<bool> {
    let approved = Evidence::approved_total(campaign.id, &deps.db_pool).await?;
    if !owes_evidence(campaign, approved) {
        return Ok(false);
    }

    let mut tx = deps.db_pool.begin().await?;
    if !Campaign::mark_penalty_applied(campaign.id, &mut tx).await? {
        return Ok(false);
    }
    transparency::activities::apply_event_in(
        campaign.organization_id,
        ScoreEvent::EvidenceDeadlineMissed,
        Some(campaign.id),
        None,
        &mut tx,
    )
    .await?;
    tx.commit().await?;

    info!(
        campaign_id = %campaign.id,
        collected = %campaign.collected_amount,
        approved = %approved,
        "Evidence deadline penalty applied"
    );
    let org = Organization::find_by_id(campaign.organization_id, &deps.db_pool).await?;
    notifications::notify(
        org.user_id,
        NotificationType::EvidenceRequired,
        "Harcama kanıtı süresi doldu",
        &format!(
            "\"{}\" kampanyası için harcama kanıtı süresi doldu ve şeffaflık puanınız düşürüldü.",
            campaign.title
        ),
        Some(json!({ "campaign_id": campaign.id })),
        deps,
    )
    .await;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminders_fire_on_seven_three_and_one() {
        let days: Vec<i64> = (0..10).filter(|d| is_reminder_day(*d)).collect();
        assert_eq!(days, vec![1, 3, 7]);
    }
}
