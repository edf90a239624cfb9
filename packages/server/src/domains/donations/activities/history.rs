use anyhow::Result;

use crate::common::utils::masking::{mask_email, mask_name, ANONYMOUS_DONOR_NAME};
use crate::common::utils::receipt_number;
use crate::common::{ApiError, AuthUser, CampaignId, DonationId, PageParams, Paged};
use crate::domains::campaigns::activities::views::{ensure_visible, find_campaign, find_owned_campaign};
use crate::domains::donations::data::ReceiptVerification;
use crate::domains::donations::models::{Donation, DonationReceipt, PublicDonor};
use crate::domains::organizations::models::Organization;
use crate::kernel::ServerDeps;

pub async fn my_donations(
    page: PageParams,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<Donation>> {
    let items =
        Donation::find_for_donor(user.user_id, page.limit(), page.offset(), &deps.db_pool).await?;
    let total = Donation::count_for_donor(user.user_id, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

/// Donation visible to its donor and admins. Guest donations are admin-only.
pub async fn find_own_donation(
    id: DonationId,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Donation> {
    let donation = Donation::find_by_id_optional(id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Donation"))?;
    let allowed = user.is_admin() || donation.donor_id == Some(user.user_id);
    if !allowed {
        return Err(ApiError::not_found("Donation").into());
    }
    Ok(donation)
}

pub async fn get_donation(id: DonationId, user: &AuthUser, deps: &ServerDeps) -> Result<Donation> {
    find_own_donation(id, user, deps).await
}

pub async fn get_receipt(
    id: DonationId,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<DonationReceipt> {
    let donation = find_own_donation(id, user, deps).await?;
    let receipt = DonationReceipt::find_by_donation(donation.id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Receipt"))?;
    Ok(receipt)
}

pub async fn verify_receipt(number: &str, deps: &ServerDeps) -> Result<ReceiptVerification> {
    let number = number.trim().to_uppercase();
    if !receipt_number::validate_format(&number) {
        return Ok(ReceiptVerification::default());
    }
    let Some(receipt) = DonationReceipt::find_by_number(&number, &deps.db_pool).await? else {
        return Ok(ReceiptVerification::default());
    };
    Ok(ReceiptVerification {
        valid: true,
        receipt_number: Some(receipt.receipt_number),
        amount: Some(receipt.amount),
        currency: Some(receipt.currency),
        campaign_title: Some(receipt.campaign_title),
        organization_name: Some(receipt.organization_name),
        donor_name: Some(if receipt.donor_name == ANONYMOUS_DONOR_NAME {
            receipt.donor_name
        } else {
            mask_name(&receipt.donor_name)
        }),
        issued_at: Some(receipt.issued_at),
    })
}

pub async fn campaign_donors(
    campaign_id: CampaignId,
    page: PageParams,
    viewer: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<Paged<PublicDonor>> {
    let campaign = find_campaign(campaign_id, deps).await?;
    let org = Organization::find_by_id(campaign.organization_id, &deps.db_pool).await?;
    ensure_visible(&campaign, &org, viewer)?;

    let items =
        Donation::find_public_donors(campaign.id, page.limit(), page.offset(), &deps.db_pool)
            .await?;
    let total = Donation::count_public_donors(campaign.id, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

/// What an organization sees of a donation: guest e-mails are masked and
/// anonymous donors stay anonymous.
fn organization_view(mut donation: Donation) -> Donation {
    donation.guest_email = donation.guest_email.as_deref().map(mask_email);
    if donation.is_anonymous {
        donation.donor_id = None;
        donation.donor_display_name = Some(ANONYMOUS_DONOR_NAME.to_string());
    }
    donation
}

pub async fn campaign_donations(
    campaign_id: CampaignId,
    page: PageParams,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<Donation>> {
    let (campaign, _) = find_owned_campaign(campaign_id, user, true, deps).await?;
    let items =
        Donation::find_for_campaign(campaign.id, page.limit(), page.offset(), &deps.db_pool)
            .await?;
    let total = Donation::count_for_campaign(campaign.id, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total).map(organization_view))
}

pub async fn organization_donations(
    page: PageParams,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<Donation>> {
    let org = Organization::find_by_user(user.user_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Organization"))?;
    let items =
        Donation::find_for_organization(org.id, page.limit(), page.offset(), &deps.db_pool)
            .await?;
    let total = Donation::count_for_organization(org.id, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total).map(organization_view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::common::UserId;
    use crate::domains::donations::models::{DonationStatus, PaymentMethod, RefundStatus};

    fn donation(is_anonymous: bool, guest_email: Option<&str>) -> Donation {
        Donation {
            id: DonationId::new(),
            campaign_id: CampaignId::new(),
            donor_id: guest_email.is_none().then(UserId::new),
            amount: Decimal::from(100),
            currency: "TRY".to_string(),
            status: DonationStatus::Completed,
            payment_method: PaymentMethod::CreditCard,
            transaction_id: Some("MOCK-1".to_string()),
            failure_reason: None,
            is_anonymous,
            donor_message: None,
            donor_display_name: Some("Ayşe Yılmaz".to_string()),
            guest_email: guest_email.map(str::to_string),
            ip_address: None,
            user_agent: None,
            source: "web".to_string(),
            refund_status: RefundStatus::None,
            refund_reason: None,
            refund_requested_at: None,
            refund_processed_at: None,
            refund_processed_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn organizations_see_masked_guest_emails() {
        let view = organization_view(donation(false, Some("ayse@example.com")));
        assert_eq!(view.guest_email.as_deref(), Some("a***@example.com"));
        assert_eq!(view.donor_display_name.as_deref(), Some("Ayşe Yılmaz"));
    }

    #[test]
    fn anonymous_donors_lose_identity() {
        let view = organization_view(donation(true, None));
        assert!(view.donor_id.is_none());
        assert_eq!(view.donor_display_name.as_deref(), Some(ANONYMOUS_DONOR_NAME));
    }
}
