use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::common::{ApiError, AuthUser, RecurringDonationId, RequestMeta, UserId};
use crate::domains::campaigns::models::{Campaign, CampaignStatus};
use crate::domains::donations::activities::settlement::{
    amount_limits, maintenance_mode, notify_owner, profile_name, require_accepting_donations,
    require_donations_open, settle_in,
};
use crate::domains::donations::data::{
    check_amount_range, donor_name, CreateRecurringInput, RecurringSummary,
    UpdateRecurringInput, DEFAULT_CURRENCY,
};
use crate::domains::donations::models::{
    Donation, DonationStatus, NewDonation, NewRecurringDonation, PaymentMethod,
    RecurringDonation, RecurringStatus,
};
use crate::domains::notifications::{self, NotificationType};
use crate::domains::organizations::models::Organization;
use crate::kernel::{PaymentOutcome, PaymentRequest, PaymentSource, ServerDeps};

pub async fn create_recurring(
    input: CreateRecurringInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<RecurringDonation> {
    require_donations_open(deps).await?;
    let (min, max) = amount_limits(deps).await;
    check_amount_range("amount", input.amount, min, max)?;

    let organization_id = match (input.campaign_id, input.organization_id) {
        (None, None) => {
            return Err(ApiError::validation(
                "campaign_id",
                "Either campaign_id or organization_id is required",
            )
            .into())
        }
        (Some(campaign_id), org_id) => {
            let campaign = Campaign::find_by_id_optional(campaign_id, &deps.db_pool)
                .await?
                .ok_or_else(|| ApiError::not_found("Campaign"))?;
            require_accepting_donations(&campaign)?;
            if org_id.is_some_and(|id| id != campaign.organization_id) {
                return Err(ApiError::validation(
                    "organization_id",
                    "Campaign does not belong to this organization",
                )
                .into());
            }
            campaign.organization_id
        }
        (None, Some(org_id)) => {
            let org = Organization::find_by_id_optional(org_id, &deps.db_pool)
                .await?
                .filter(|o| o.is_approved())
                .ok_or_else(|| ApiError::not_found("Organization"))?;
            org.id
        }
    };

    let card_token = deps.payment_gateway.tokenize(&input.card).await?;
    let plan = RecurringDonation::create(
        NewRecurringDonation {
            donor_id: user.user_id,
            campaign_id: input.campaign_id,
            organization_id: Some(organization_id),
            amount: input.amount,
            currency: DEFAULT_CURRENCY.to_string(),
            frequency: input.frequency,
            next_payment_date: input.frequency.next_date(Utc::now().date_naive()),
            card_token,
        },
        &deps.db_pool,
    )
    .await?;

    info!(
        recurring_id = %plan.id,
        frequency = ?plan.frequency,
        amount = %plan.amount,
        "Recurring donation created"
    );
    Ok(plan)
}

pub async fn my_recurring(user: &AuthUser, deps: &ServerDeps) -> Result<RecurringSummary> {
    let plans = RecurringDonation::find_for_donor(user.user_id, &deps.db_pool).await?;
    Ok(RecurringSummary::new(plans))
}

async fn find_own_plan(
    id: RecurringDonationId,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<RecurringDonation> {
    let plan = RecurringDonation::find_by_id_optional(id, &deps.db_pool)
        .await?
        .filter(|p| p.donor_id == user.user_id)
        .ok_or_else(|| ApiError::not_found("Recurring donation"))?;
    Ok(plan)
}

pub async fn update_recurring(
    id: RecurringDonationId,
    input: UpdateRecurringInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<RecurringDonation> {
    let plan = find_own_plan(id, user, deps).await?;
    if matches!(plan.status, RecurringStatus::Cancelled | RecurringStatus::Failed) {
        return Err(ApiError::bad_request("Recurring donation is no longer active").into());
    }

    let amount = match input.amount {
        Some(amount) => {
            let (min, max) = amount_limits(deps).await;
            check_amount_range("amount", amount, min, max)?;
            amount
        }
        None => plan.amount,
    };
    let frequency = input.frequency.unwrap_or(plan.frequency);
    let next_payment_date = if frequency != plan.frequency && plan.status == RecurringStatus::Active
    {
        frequency.next_date(Utc::now().date_naive())
    } else {
        plan.next_payment_date
    };

    RecurringDonation::update_terms(id, amount, frequency, next_payment_date, &deps.db_pool).await
}

async fn move_plan(
    id: RecurringDonationId,
    from: RecurringStatus,
    to: RecurringStatus,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<RecurringDonation> {
    let plan = find_own_plan(id, user, deps).await?;
    if plan.status != from {
        return Err(ApiError::bad_request(format!(
            "Recurring donation is {:?}",
            plan.status
        ))
        .into());
    }
    let next = (to == RecurringStatus::Active)
        .then(|| plan.frequency.next_date(Utc::now().date_naive()));
    let moved = RecurringDonation::transition(id, from, to, next, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::conflict("Recurring donation was changed concurrently"))?;
    info!(recurring_id = %id, from = ?from, to = ?to, "Recurring donation status changed");
    Ok(moved)
}

pub async fn pause_recurring(
    id: RecurringDonationId,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<RecurringDonation> {
    move_plan(id, RecurringStatus::Active, RecurringStatus::Paused, user, deps).await
}

pub async fn resume_recurring(
    id: RecurringDonationId,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<RecurringDonation> {
    move_plan(id, RecurringStatus::Paused, RecurringStatus::Active, user, deps).await
}

pub async fn cancel_recurring(
    id: RecurringDonationId,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<RecurringDonation> {
    let plan = find_own_plan(id, user, deps).await?;
    match plan.status {
        RecurringStatus::Cancelled => {
            Err(ApiError::bad_request("Recurring donation is already cancelled").into())
        }
        from => move_plan(id, from, RecurringStatus::Cancelled, user, deps).await,
    }
}

// =============================================================================
// Scheduled charging
// =============================================================================

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct RecurringRunStats {
    pub charged: usize,
    pub declined: usize,
    pub skipped: usize,
    pub stopped: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlanOutcome {
    Charged,
    Declined,
    Skipped,
    Stopped,
}

/// What the scheduler may do with a plan given the state of its campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CampaignGate {
    Charge,
    /// Temporarily closed; try again on the next run.
    Wait,
    /// Will never take donations again.
    Stop,
}

fn campaign_gate(plan: &RecurringDonation, campaign: Option<&Campaign>) -> CampaignGate {
    match (plan.campaign_id, campaign) {
        (None, _) => CampaignGate::Charge,
        (Some(_), None) => CampaignGate::Stop,
        (Some(_), Some(campaign)) => match campaign.status {
            CampaignStatus::Active => CampaignGate::Charge,
            CampaignStatus::Paused | CampaignStatus::PendingApproval | CampaignStatus::Draft => {
                CampaignGate::Wait
            }
            CampaignStatus::Completed | CampaignStatus::Cancelled | CampaignStatus::Rejected => {
                CampaignGate::Stop
            }
        },
    }
}

/// Gateway reference for one billing period of a plan. Stable across retries
/// of the same period.
fn period_reference(plan: &RecurringDonation) -> String {
    format!("recurring-{}-{}", plan.id, plan.next_payment_date)
}

/// Charges every active plan due today or earlier. One plan failing never
/// stops the others. Nothing is charged during maintenance.
pub async fn process_due_recurring(deps: &ServerDeps) -> Result<RecurringRunStats> {
    if maintenance_mode(deps).await {
        info!("Maintenance mode is on, recurring charges postponed");
        return Ok(RecurringRunStats::default());
    }
    let today = Utc::now().date_naive();
    let due = RecurringDonation::find_due(today, &deps.db_pool).await?;
    let mut stats = RecurringRunStats::default();

    for plan in due {
        match charge_plan(&plan, deps).await {
            Ok(PlanOutcome::Charged) => stats.charged += 1,
            Ok(PlanOutcome::Declined) => stats.declined += 1,
            Ok(PlanOutcome::Skipped) => stats.skipped += 1,
            Ok(PlanOutcome::Stopped) => stats.stopped += 1,
            Err(e) => {
                stats.errors += 1;
                warn!(error = %e, recurring_id = %plan.id, "Recurring charge failed");
            }
        }
    }
    Ok(stats)
}

async fn stop_plan(plan: &RecurringDonation, deps: &ServerDeps) -> Result<PlanOutcome> {
    let Some(stopped) =
        RecurringDonation::stop(plan.id, "Campaign is no longer accepting donations", &deps.db_pool)
            .await?
    else {
        return Ok(PlanOutcome::Skipped);
    };
    info!(recurring_id = %stopped.id, campaign_id = ?stopped.campaign_id, "Recurring donation stopped");
    notifications::notify(
        stopped.donor_id,
        NotificationType::System,
        "Düzenli bağış durduruldu",
        "Bağış yaptığınız kampanya artık bağış kabul etmediği için düzenli bağışınız iptal edildi.",
        Some(json!({ "recurring_id": stopped.id, "campaign_id": stopped.campaign_id })),
        deps,
    )
    .await;
    Ok(PlanOutcome::Stopped)
}

/// The schedule is advanced before the card is charged, so a charge that
/// succeeds can never be repeated for the same period. A decline puts the
/// period back for the next run.
async fn charge_plan(plan: &RecurringDonation, deps: &ServerDeps) -> Result<PlanOutcome> {
    let campaign = match plan.campaign_id {
        Some(id) => Campaign::find_by_id_optional(id, &deps.db_pool).await?,
        None => None,
    };
    match campaign_gate(plan, campaign.as_ref()) {
        CampaignGate::Charge => {}
        CampaignGate::Wait => return Ok(PlanOutcome::Skipped),
        CampaignGate::Stop => return stop_plan(plan, deps).await,
    }

    let period = plan.next_payment_date;
    let next_date = plan.frequency.next_date(period.max(Utc::now().date_naive()));
    if RecurringDonation::claim_period(plan.id, period, next_date, &deps.db_pool)
        .await?
        .is_none()
    {
        return Ok(PlanOutcome::Skipped);
    }

    let mut pending = None;
    if let Some(campaign) = &campaign {
        let org = Organization::find_by_id(campaign.organization_id, &deps.db_pool).await?;
        let fallback = profile_name(Some(plan.donor_id), deps).await?;
        let display_name = donor_name(false, None, &fallback);
        let new = NewDonation {
            campaign_id: campaign.id,
            donor_id: Some(plan.donor_id),
            amount: plan.amount,
            currency: plan.currency.clone(),
            payment_method: PaymentMethod::Recurring,
            is_anonymous: false,
            donor_message: None,
            donor_display_name: Some(display_name.clone()),
            guest_email: None,
            meta: RequestMeta::default(),
            source: "recurring".to_string(),
        };
        let mut conn = deps.db_pool.acquire().await?;
        let donation = Donation::insert(&new, DonationStatus::Pending, None, &mut conn).await?;
        pending = Some((donation, org, display_name));
    }

    let outcome = deps
        .payment_gateway
        .charge(PaymentRequest {
            amount: plan.amount,
            currency: plan.currency.clone(),
            source: PaymentSource::Token(plan.card_token.clone()),
            reference: period_reference(plan),
            description: "Düzenli bağış".to_string(),
        })
        .await;
    let transaction_id = match outcome {
        Ok(PaymentOutcome::Succeeded { transaction_id }) => transaction_id,
        Ok(PaymentOutcome::Declined { reason }) => {
            if let Some((donation, _, _)) = &pending {
                Donation::mark_failed(donation.id, &reason, &deps.db_pool).await?;
            }
            let updated =
                RecurringDonation::record_failure(plan.id, &reason, period, &deps.db_pool).await?;
            info!(
                recurring_id = %plan.id,
                failure_count = updated.failure_count,
                status = ?updated.status,
                "Recurring charge declined"
            );
            return Ok(PlanOutcome::Declined);
        }
        Err(e) => {
            let reason = "Payment gateway unavailable";
            if let Some((donation, _, _)) = &pending {
                Donation::mark_failed(donation.id, reason, &deps.db_pool).await?;
            }
            RecurringDonation::record_failure(plan.id, reason, period, &deps.db_pool).await?;
            return Err(e);
        }
    };

    let settled = settle_charge(plan, campaign.as_ref(), pending.as_ref(), &transaction_id, deps).await;
    let settled = match settled {
        Ok(settled) => settled,
        Err(e) => {
            error!(
                error = %e,
                recurring_id = %plan.id,
                transaction_id = %transaction_id,
                "Recurring charge succeeded but could not be recorded"
            );
            return Err(e);
        }
    };

    info!(recurring_id = %plan.id, transaction_id = %transaction_id, next_date = %next_date, "Recurring charge succeeded");
    if let (Some(campaign), Some((donation, owner_id))) = (&campaign, &settled) {
        notify_owner(*owner_id, campaign, donation, deps).await;
    }
    Ok(PlanOutcome::Charged)
}

async fn settle_charge(
    plan: &RecurringDonation,
    campaign: Option<&Campaign>,
    pending: Option<&(Donation, Organization, String)>,
    transaction_id: &str,
    deps: &ServerDeps,
) -> Result<Option<(Donation, UserId)>> {
    let mut tx = deps.db_pool.begin().await?;
    let mut settled = None;
    if let (Some(campaign), Some((pending, org, display_name))) = (campaign, pending) {
        let donation = Donation::mark_completed(pending.id, transaction_id, &mut tx)
            .await?
            .ok_or_else(|| ApiError::conflict("Donation is no longer pending"))?;
        settle_in(&donation, &campaign.title, &org.legal_name, display_name, &mut tx).await?;
        settled = Some((donation, org.user_id));
    }
    RecurringDonation::record_success(plan.id, plan.amount, &mut tx).await?;
    tx.commit().await?;
    Ok(settled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use crate::domains::donations::models::RecurringFrequency;

    fn plan(campaign_id: Option<crate::common::CampaignId>) -> RecurringDonation {
        RecurringDonation {
            id: RecurringDonationId::new(),
            donor_id: UserId::new(),
            campaign_id,
            organization_id: None,
            amount: Decimal::from(100),
            currency: "TRY".to_string(),
            frequency: RecurringFrequency::Monthly,
            status: RecurringStatus::Active,
            next_payment_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            last_payment_at: None,
            total_donated: Decimal::ZERO,
            payment_count: 0,
            failure_count: 0,
            last_failure_reason: None,
            card_token: "tok".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn organization_plans_are_always_charged() {
        assert_eq!(campaign_gate(&plan(None), None), CampaignGate::Charge);
    }

    #[test]
    fn missing_campaign_stops_the_plan() {
        let plan = plan(Some(crate::common::CampaignId::new()));
        assert_eq!(campaign_gate(&plan, None), CampaignGate::Stop);
    }

    #[test]
    fn period_reference_is_stable_per_period() {
        let mut p = plan(None);
        let first = period_reference(&p);
        assert_eq!(first, period_reference(&p));
        assert!(first.ends_with("2026-03-01"));

        p.next_payment_date = RecurringFrequency::Monthly.next_date(p.next_payment_date);
        assert_ne!(first, period_reference(&p));
    }
}
