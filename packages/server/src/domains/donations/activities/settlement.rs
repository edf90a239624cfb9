//! Steps shared by every way money reaches a campaign.

use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgConnection;

use crate::common::{ApiError, UserId};
use crate::domains::auth::models::UserProfile;
use crate::domains::campaigns::models::{Campaign, CampaignStatus};
use crate::domains::donations::models::{Donation, DonationReceipt, ReceiptDetails};
use crate::domains::notifications::{self, NotificationType};
use crate::domains::settings::{self, activities as setting_keys};
use crate::kernel::ServerDeps;

pub const DEFAULT_MIN_AMOUNT: i64 = 10;
pub const DEFAULT_MAX_AMOUNT: i64 = 1_000_000;
pub const FALLBACK_DONOR_NAME: &str = "Bağışçı";

/// `(min, max)` accepted per donation.
pub async fn amount_limits(deps: &ServerDeps) -> (Decimal, Decimal) {
    let min = settings::get_decimal(
        setting_keys::MIN_DONATION_AMOUNT,
        Decimal::from(DEFAULT_MIN_AMOUNT),
        deps,
    )
    .await;
    let max = settings::get_decimal(
        setting_keys::MAX_DONATION_AMOUNT,
        Decimal::from(DEFAULT_MAX_AMOUNT),
        deps,
    )
    .await;
    (min, max)
}

pub async fn maintenance_mode(deps: &ServerDeps) -> bool {
    settings::get_bool(setting_keys::MAINTENANCE_MODE, false, deps).await
}

/// New donations are refused while the platform is in maintenance.
pub async fn require_donations_open(deps: &ServerDeps) -> Result<(), ApiError> {
    if maintenance_mode(deps).await {
        return Err(ApiError::Unavailable(
            "Donations are temporarily disabled for maintenance".to_string(),
        ));
    }
    Ok(())
}

pub fn require_accepting_donations(campaign: &Campaign) -> Result<(), ApiError> {
    if campaign.status != CampaignStatus::Active {
        return Err(ApiError::bad_request(format!(
            "Campaign {} is not accepting donations",
            campaign.id
        )));
    }
    Ok(())
}

pub async fn profile_name(user_id: Option<UserId>, deps: &ServerDeps) -> anyhow::Result<String> {
    let Some(user_id) = user_id else {
        return Ok(FALLBACK_DONOR_NAME.to_string());
    };
    let name = UserProfile::find_by_user(user_id, &deps.db_pool)
        .await?
        .map(|p| p.full_name())
        .unwrap_or_else(|| FALLBACK_DONOR_NAME.to_string());
    Ok(name)
}

/// Adds a completed donation to its campaign totals and issues the receipt.
/// Runs inside the caller's transaction.
pub async fn settle_in(
    donation: &Donation,
    campaign_title: &str,
    organization_name: &str,
    donor_name: &str,
    conn: &mut PgConnection,
) -> anyhow::Result<DonationReceipt> {
    Campaign::record_donation(donation.campaign_id, donation.amount, &mut *conn).await?;
    let receipt = DonationReceipt::issue(
        ReceiptDetails {
            donation_id: donation.id,
            amount: donation.amount,
            currency: donation.currency.clone(),
            campaign_title: campaign_title.to_string(),
            organization_name: organization_name.to_string(),
            donor_name: donor_name.to_string(),
        },
        conn,
    )
    .await?;
    Ok(receipt)
}

pub async fn notify_owner(owner_id: UserId, campaign: &Campaign, donation: &Donation, deps: &ServerDeps) {
    notifications::notify(
        owner_id,
        NotificationType::DonationReceived,
        "Yeni bağış",
        &format!(
            "\"{}\" kampanyanıza {} {} bağış yapıldı.",
            campaign.title, donation.amount, donation.currency
        ),
        Some(json!({
            "campaign_id": campaign.id,
            "donation_id": donation.id,
            "amount": donation.amount,
        })),
        deps,
    )
    .await;
}
