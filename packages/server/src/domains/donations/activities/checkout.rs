//! Card donations: single donation, cart checkout, guest checkout.

use std::collections::HashMap;

use anyhow::Result;
use rust_decimal::Decimal;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::common::validation::{email, max_length, require_text};
use crate::common::{ApiError, AuthUser, CampaignId, RequestMeta, UserId};
use crate::domains::campaigns::models::Campaign;
use crate::domains::donations::activities::settlement::{
    amount_limits, notify_owner, profile_name, require_accepting_donations, require_donations_open,
    settle_in,
};
use crate::domains::donations::data::{
    check_amount_range, check_item_count, donor_name, CheckoutInput, CheckoutItem, CheckoutLine,
    CheckoutResult, DonateInput, DonationConfirmation, GuestCheckoutInput, DEFAULT_CURRENCY,
    MAX_DONOR_MESSAGE_LENGTH,
};
use crate::domains::donations::models::{Donation, DonationStatus, NewDonation, PaymentMethod};
use crate::domains::organizations::models::Organization;
use crate::kernel::{CardDetails, PaymentOutcome, PaymentRequest, PaymentSource, ServerDeps};

const SOURCE_WEB: &str = "web";

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Single card donation. The donation is stored as PENDING before the
/// charge so a declined attempt leaves a FAILED record behind.
pub async fn donate(
    input: DonateInput,
    donor: Option<&AuthUser>,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<DonationConfirmation> {
    require_donations_open(deps).await?;
    let donor_message = clean(input.donor_message);
    max_length("donor_message", donor_message.as_deref(), MAX_DONOR_MESSAGE_LENGTH)?;
    let (min, max) = amount_limits(deps).await;
    check_amount_range("amount", input.amount, min, max)?;

    let campaign = Campaign::find_by_id_optional(input.campaign_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Campaign"))?;
    require_accepting_donations(&campaign)?;
    let org = Organization::find_by_id(campaign.organization_id, &deps.db_pool).await?;

    let donor_id = donor.map(|d| d.user_id);
    let fallback = profile_name(donor_id, deps).await?;
    let display_name = donor_name(input.is_anonymous, input.donor_display_name.as_deref(), &fallback);

    let new = NewDonation {
        campaign_id: campaign.id,
        donor_id,
        amount: input.amount,
        currency: campaign.currency.clone(),
        payment_method: PaymentMethod::CreditCard,
        is_anonymous: input.is_anonymous,
        donor_message,
        donor_display_name: Some(display_name.clone()),
        guest_email: None,
        meta: meta.clone(),
        source: SOURCE_WEB.to_string(),
    };
    let pending = {
        let mut conn = deps.db_pool.acquire().await?;
        Donation::insert(&new, DonationStatus::Pending, None, &mut conn).await?
    };

    let transaction_id = match charge_card(
        input.amount,
        &campaign.currency,
        input.card,
        pending.id.to_string(),
        format!("Bağış: {}", campaign.title),
        deps,
    )
    .await
    {
        Ok(id) => id,
        Err(e) => {
            let reason = match e.downcast_ref::<ApiError>() {
                Some(ApiError::PaymentFailed(reason)) => reason.clone(),
                _ => "Payment gateway unavailable".to_string(),
            };
            if let Err(mark_err) = Donation::mark_failed(pending.id, &reason, &deps.db_pool).await {
                warn!(error = %mark_err, donation_id = %pending.id, "Failed to mark donation as failed");
            }
            return Err(e);
        }
    };

    let mut tx = deps.db_pool.begin().await?;
    let donation = Donation::mark_completed(pending.id, &transaction_id, &mut tx)
        .await?
        .ok_or_else(|| ApiError::conflict("Donation is no longer pending"))?;
    let receipt = settle_in(&donation, &campaign.title, &org.legal_name, &display_name, &mut tx).await?;
    if let Err(e) = tx.commit().await {
        error!(
            error = %e,
            donation_id = %donation.id,
            transaction_id = %transaction_id,
            "Charge succeeded but donation could not be completed"
        );
        return Err(e.into());
    }

    info!(
        donation_id = %donation.id,
        campaign_id = %campaign.id,
        amount = %donation.amount,
        receipt_number = %receipt.receipt_number,
        "Donation completed"
    );
    notify_owner(org.user_id, &campaign, &donation, deps).await;

    Ok(DonationConfirmation { donation, receipt })
}

/// Charges the card. Declines surface as `ApiError::PaymentFailed` (402).
async fn charge_card(
    amount: Decimal,
    currency: &str,
    card: CardDetails,
    reference: String,
    description: String,
    deps: &ServerDeps,
) -> Result<String> {
    let outcome = deps
        .payment_gateway
        .charge(PaymentRequest {
            amount,
            currency: currency.to_string(),
            source: PaymentSource::Card(card),
            reference: reference.clone(),
            description,
        })
        .await?;

    match outcome {
        PaymentOutcome::Succeeded { transaction_id } => Ok(transaction_id),
        PaymentOutcome::Declined { reason } => {
            info!(reference = %reference, reason = %reason, "Card charge declined");
            Err(ApiError::PaymentFailed(reason).into())
        }
    }
}

// =============================================================================
// Checkout
// =============================================================================

struct Payer {
    donor_id: Option<UserId>,
    guest_email: Option<String>,
    display_name: String,
}

pub async fn checkout(
    input: CheckoutInput,
    donor: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<CheckoutResult> {
    let fallback = profile_name(Some(donor.user_id), deps).await?;
    let payer = Payer {
        donor_id: Some(donor.user_id),
        guest_email: None,
        display_name: donor_name(input.is_anonymous, None, &fallback),
    };
    run_checkout(
        input.items,
        input.is_anonymous,
        input.donor_message,
        input.card,
        payer,
        meta,
        deps,
    )
    .await
}

pub async fn guest_checkout(
    input: GuestCheckoutInput,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<CheckoutResult> {
    require_text("guest_name", &input.guest_name)?;
    max_length("guest_name", Some(&input.guest_name), 200)?;
    let guest_email = email::normalize(&input.guest_email);
    email::validate(&guest_email).into_api_result("guest_email")?;

    let payer = Payer {
        donor_id: None,
        guest_email: Some(guest_email),
        display_name: donor_name(input.is_anonymous, Some(&input.guest_name), &input.guest_name),
    };
    run_checkout(
        input.items,
        input.is_anonymous,
        input.donor_message,
        input.card,
        payer,
        meta,
        deps,
    )
    .await
}

/// Validates every item, charges the total once and only then writes the
/// donations, all in one transaction.
async fn run_checkout(
    items: Vec<CheckoutItem>,
    is_anonymous: bool,
    donor_message: Option<String>,
    card: CardDetails,
    payer: Payer,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<CheckoutResult> {
    require_donations_open(deps).await?;
    check_item_count(&items)?;
    let donor_message = clean(donor_message);
    max_length("donor_message", donor_message.as_deref(), MAX_DONOR_MESSAGE_LENGTH)?;

    let (min, max) = amount_limits(deps).await;
    for (index, item) in items.iter().enumerate() {
        check_amount_range(&format!("items[{}].amount", index), item.amount, min, max)?;
    }

    let ids: Vec<CampaignId> = items.iter().map(|i| i.campaign_id).collect();
    let campaigns: HashMap<CampaignId, Campaign> = Campaign::find_many(&ids, &deps.db_pool)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    for id in &ids {
        let campaign = campaigns
            .get(id)
            .ok_or_else(|| ApiError::NotFound(format!("Campaign {} not found", id)))?;
        require_accepting_donations(campaign)?;
    }

    let mut organizations: HashMap<_, Organization> = HashMap::new();
    for campaign in campaigns.values() {
        if !organizations.contains_key(&campaign.organization_id) {
            let org = Organization::find_by_id(campaign.organization_id, &deps.db_pool).await?;
            organizations.insert(org.id, org);
        }
    }

    let total_amount: Decimal = items.iter().map(|i| i.amount).sum();
    let checkout_id = Uuid::new_v4();
    let transaction_id = charge_card(
        total_amount,
        DEFAULT_CURRENCY,
        card,
        format!("checkout-{}", checkout_id),
        format!("Sepet bağışı ({} kampanya)", items.len()),
        deps,
    )
    .await?;

    let mut tx = deps.db_pool.begin().await?;
    let mut completed = Vec::with_capacity(items.len());
    let mut lines = Vec::with_capacity(items.len());
    for item in &items {
        let campaign = &campaigns[&item.campaign_id];
        let org = &organizations[&campaign.organization_id];
        let new = NewDonation {
            campaign_id: campaign.id,
            donor_id: payer.donor_id,
            amount: item.amount,
            currency: campaign.currency.clone(),
            payment_method: PaymentMethod::CreditCard,
            is_anonymous,
            donor_message: donor_message.clone(),
            donor_display_name: Some(payer.display_name.clone()),
            guest_email: payer.guest_email.clone(),
            meta: meta.clone(),
            source: SOURCE_WEB.to_string(),
        };
        let donation =
            Donation::insert(&new, DonationStatus::Completed, Some(&transaction_id), &mut tx)
                .await?;
        let receipt =
            settle_in(&donation, &campaign.title, &org.legal_name, &payer.display_name, &mut tx)
                .await?;
        lines.push(CheckoutLine {
            donation_id: donation.id,
            receipt_number: receipt.receipt_number,
            campaign_id: campaign.id,
            campaign_title: campaign.title.clone(),
            amount: donation.amount,
        });
        completed.push(donation);
    }
    if let Err(e) = tx.commit().await {
        error!(
            error = %e,
            checkout_id = %checkout_id,
            transaction_id = %transaction_id,
            "Charge succeeded but checkout could not be recorded"
        );
        return Err(e.into());
    }

    info!(
        checkout_id = %checkout_id,
        items = completed.len(),
        total = %total_amount,
        guest = payer.donor_id.is_none(),
        "Checkout completed"
    );
    for donation in &completed {
        let campaign = &campaigns[&donation.campaign_id];
        let owner = organizations[&campaign.organization_id].user_id;
        notify_owner(owner, campaign, donation, deps).await;
    }

    Ok(CheckoutResult {
        donations: lines,
        total_amount,
        currency: DEFAULT_CURRENCY.to_string(),
        guest_email: payer.guest_email,
    })
}
