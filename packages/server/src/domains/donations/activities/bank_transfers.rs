//! Bank transfer pledges: the donor gets a reference code and our account
//! details, an admin later matches the incoming wire against the code.

use anyhow::Result;
use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::common::utils::reference_code;
use crate::common::validation::{iban, max_length};
use crate::common::{AdminCapability, ApiError, AuthUser, PageParams, Paged, RequestMeta};
use crate::domains::audit::{self, AuditAction, AuditEntry};
use crate::domains::campaigns::models::Campaign;
use crate::domains::donations::activities::settlement::{
    amount_limits, notify_owner, profile_name, require_accepting_donations, require_donations_open,
    settle_in,
};
use crate::domains::donations::data::{
    check_amount_range, check_positive, donor_name, transfer_instructions,
    BankTransferInstructions, CreateBankTransferInput, DonationConfirmation,
    MatchBankTransferInput,
};
use crate::domains::donations::models::{
    BankTransferReference, BankTransferStatus, Donation, DonationStatus, NewBankTransfer,
    NewDonation, PaymentMethod,
};
use crate::domains::notifications::{self, NotificationType};
use crate::domains::organizations::models::{BankAccount, Organization};
use crate::kernel::ServerDeps;

pub const VALIDITY_DAYS: i64 = 7;
const MAX_CODE_ATTEMPTS: usize = 10;

/// Normalized code, or a field error when it cannot be one of ours.
fn parse_code(raw: &str) -> Result<String, ApiError> {
    let code = reference_code::normalize(raw);
    if !reference_code::validate_format(&code) {
        return Err(ApiError::validation(
            "reference_code",
            "Reference code must look like SBP-YYYYMMDD-XXXXX",
        ));
    }
    Ok(code)
}

async fn unique_reference_code(deps: &ServerDeps) -> Result<String> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = reference_code::generate(Utc::now().date_naive());
        if !BankTransferReference::code_exists(&code, &deps.db_pool).await? {
            return Ok(code);
        }
    }
    anyhow::bail!("could not generate a unique bank transfer reference")
}

pub async fn create_bank_transfer(
    input: CreateBankTransferInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<BankTransferInstructions> {
    require_donations_open(deps).await?;
    let (min, max) = amount_limits(deps).await;
    check_amount_range("amount", input.amount, min, max)?;
    let sender_name = input
        .sender_name
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    max_length("sender_name", sender_name.as_deref(), 200)?;

    let campaign = Campaign::find_by_id_optional(input.campaign_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Campaign"))?;
    require_accepting_donations(&campaign)?;
    let account = BankAccount::find_preferred(campaign.organization_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization has no bank account".to_string()))?;

    let code = unique_reference_code(deps).await?;
    let reference = BankTransferReference::create(
        NewBankTransfer {
            reference_code: code,
            campaign_id: campaign.id,
            organization_id: campaign.organization_id,
            donor_id: user.user_id,
            expected_amount: input.amount,
            sender_name,
            bank_account_snapshot: json!({
                "bank_name": account.bank_name,
                "branch_name": account.branch_name,
                "account_holder": account.account_holder,
                "iban": account.iban,
                "currency": account.currency,
            }),
            expires_at: Utc::now() + Duration::days(VALIDITY_DAYS),
        },
        &deps.db_pool,
    )
    .await?;

    info!(
        reference_code = %reference.reference_code,
        campaign_id = %campaign.id,
        amount = %reference.expected_amount,
        "Bank transfer reference created"
    );

    Ok(BankTransferInstructions {
        id: reference.id,
        instructions: transfer_instructions(&reference.reference_code, VALIDITY_DAYS),
        reference_code: reference.reference_code,
        campaign_id: campaign.id,
        campaign_title: campaign.title,
        expected_amount: reference.expected_amount,
        currency: account.currency,
        bank_name: account.bank_name,
        branch_name: account.branch_name,
        account_holder: account.account_holder,
        iban: iban::format(&account.iban),
        expires_at: reference.expires_at,
    })
}

pub async fn my_bank_transfers(
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Vec<BankTransferReference>> {
    BankTransferReference::find_pending_for_donor(user.user_id, &deps.db_pool).await
}

pub async fn get_bank_transfer(
    code: &str,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<BankTransferReference> {
    let reference = BankTransferReference::find_by_code(&parse_code(code)?, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Bank transfer"))?;
    user.actor().require_owner(reference.donor_id)?;
    Ok(reference)
}

pub async fn cancel_bank_transfer(
    code: &str,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<BankTransferReference> {
    let reference = BankTransferReference::find_by_code(&parse_code(code)?, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Bank transfer"))?;
    user.actor().require_strict_owner(reference.donor_id)?;
    if reference.status != BankTransferStatus::Pending {
        return Err(ApiError::bad_request("Only pending transfers can be cancelled").into());
    }
    let cancelled = BankTransferReference::cancel(reference.id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::bad_request("Only pending transfers can be cancelled"))?;
    info!(reference_code = %cancelled.reference_code, "Bank transfer cancelled");
    Ok(cancelled)
}

pub async fn admin_pending_transfers(
    page: PageParams,
    admin: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<BankTransferReference>> {
    admin
        .actor()
        .can(AdminCapability::ManagePayments)
        .check(deps)
        .await?;
    let items =
        BankTransferReference::find_pending(page.limit(), page.offset(), &deps.db_pool).await?;
    let total = BankTransferReference::count_pending(&deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

/// Books a received wire as a completed donation for the amount that
/// actually arrived.
pub async fn match_bank_transfer(
    input: MatchBankTransferInput,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<DonationConfirmation> {
    admin
        .actor()
        .can(AdminCapability::ManagePayments)
        .check(deps)
        .await?;
    check_positive("received_amount", input.received_amount)?;
    let code = parse_code(&input.reference_code)?;

    let mut tx = deps.db_pool.begin().await?;
    let reference = BankTransferReference::lock_by_code(&code, &mut tx)
        .await?
        .ok_or_else(|| ApiError::not_found("Bank transfer"))?;
    if reference.status != BankTransferStatus::Pending {
        return Err(ApiError::bad_request(format!(
            "Bank transfer is {:?}, only pending transfers can be matched",
            reference.status
        ))
        .into());
    }
    if reference.is_expired_at(Utc::now()) {
        drop(tx);
        BankTransferReference::mark_expired(reference.id, &deps.db_pool).await?;
        return Err(ApiError::bad_request("Bank transfer reference has expired").into());
    }

    let campaign = Campaign::find_by_id_optional(reference.campaign_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Campaign"))?;
    let org = Organization::find_by_id(reference.organization_id, &deps.db_pool).await?;
    let fallback = profile_name(Some(reference.donor_id), deps).await?;
    let display_name = donor_name(false, reference.sender_name.as_deref(), &fallback);

    let new = NewDonation {
        campaign_id: campaign.id,
        donor_id: Some(reference.donor_id),
        amount: input.received_amount,
        currency: campaign.currency.clone(),
        payment_method: PaymentMethod::BankTransfer,
        is_anonymous: false,
        donor_message: None,
        donor_display_name: Some(display_name.clone()),
        guest_email: None,
        meta: meta.clone(),
        source: "bank_transfer".to_string(),
    };
    let donation = Donation::insert(
        &new,
        DonationStatus::Completed,
        Some(&reference.reference_code),
        &mut tx,
    )
    .await?;
    let receipt = settle_in(&donation, &campaign.title, &org.legal_name, &display_name, &mut tx).await?;
    let matched =
        BankTransferReference::mark_matched(reference.id, donation.id, admin.user_id, &mut tx)
            .await?;
    tx.commit().await?;

    if donation.amount != reference.expected_amount {
        warn!(
            reference_code = %matched.reference_code,
            expected = %reference.expected_amount,
            received = %donation.amount,
            "Bank transfer amount differs from the pledge"
        );
    }
    info!(
        reference_code = %matched.reference_code,
        donation_id = %donation.id,
        "Bank transfer matched"
    );
    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::BankTransferMatch)
            .entity_type("bank_transfer")
            .entity_id(matched.id.into_uuid())
            .old_values(json!({ "status": reference.status, "expected_amount": reference.expected_amount }))
            .new_values(json!({
                "status": matched.status,
                "received_amount": donation.amount,
                "donation_id": donation.id,
            }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;
    notify_owner(org.user_id, &campaign, &donation, deps).await;

    Ok(DonationConfirmation { donation, receipt })
}

/// Scheduler entry: expires overdue references and tells each donor.
pub async fn expire_overdue_transfers(deps: &ServerDeps) -> Result<usize> {
    let expired = BankTransferReference::expire_overdue(Utc::now(), &deps.db_pool).await?;
    for reference in &expired {
        notifications::notify(
            reference.donor_id,
            NotificationType::BankTransferExpired,
            "Havale referansının süresi doldu",
            &format!(
                "{} referans kodlu havale bildiriminizin süresi doldu.",
                reference.reference_code
            ),
            Some(json!({
                "reference_code": reference.reference_code,
                "campaign_id": reference.campaign_id,
            })),
            deps,
        )
        .await;
    }
    Ok(expired.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_codes_are_normalized_before_lookup() {
        assert_eq!(parse_code(" sbp-20260309-ab3cd ").unwrap(), "SBP-20260309-AB3CD");
    }

    #[test]
    fn malformed_codes_are_field_errors() {
        for raw in ["", "SBP-2026-AB3CD", "hello", "SBP-20260309-AB3CD; DROP"] {
            match parse_code(raw) {
                Err(ApiError::Validation { field, .. }) => assert_eq!(field, "reference_code"),
                other => panic!("{:?} for {}", other, raw),
            }
        }
    }
}
