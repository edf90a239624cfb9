use anyhow::Result;
use chrono::Utc;
use serde_json::json;
use tracing::info;

use crate::common::validation::{max_length, require_text};
use crate::common::{AdminCapability, ApiError, AuthUser, DonationId, PageParams, Paged, RequestMeta};
use crate::domains::audit::{self, AuditAction, AuditEntry};
use crate::domains::campaigns::models::Campaign;
use crate::domains::donations::data::{AdminDonationQuery, RefundRequestInput, RejectRefundInput};
use crate::domains::donations::models::{Donation, DonationStatus, RefundStatus};
use crate::domains::notifications::{self, NotificationType};
use crate::domains::settings::{self, activities as setting_keys};
use crate::kernel::ServerDeps;

pub const DEFAULT_REFUND_WINDOW_DAYS: i64 = 14;

pub async fn request_refund(
    id: DonationId,
    input: RefundRequestInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Donation> {
    let reason = input.reason.trim();
    require_text("reason", reason)?;
    max_length("reason", Some(reason), 1000)?;

    let donation = Donation::find_by_id_optional(id, &deps.db_pool)
        .await?
        .filter(|d| d.donor_id == Some(user.user_id))
        .ok_or_else(|| ApiError::not_found("Donation"))?;
    if donation.status != DonationStatus::Completed {
        return Err(ApiError::bad_request("Only completed donations can be refunded").into());
    }
    if donation.refund_status != RefundStatus::None {
        return Err(ApiError::conflict("A refund was already requested for this donation").into());
    }
    let window = settings::get_i64(
        setting_keys::REFUND_WINDOW_DAYS,
        DEFAULT_REFUND_WINDOW_DAYS,
        deps,
    )
    .await;
    if !donation.within_refund_window(window, Utc::now()) {
        return Err(ApiError::bad_request(format!(
            "Refunds can only be requested within {} days",
            window
        ))
        .into());
    }

    let updated = Donation::request_refund(id, reason, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::conflict("A refund was already requested for this donation"))?;
    info!(donation_id = %id, "Refund requested");
    Ok(updated)
}

pub async fn admin_list_donations(
    query: AdminDonationQuery,
    page: PageParams,
    admin: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<Donation>> {
    admin
        .actor()
        .can(AdminCapability::ManagePayments)
        .check(deps)
        .await?;
    let items = Donation::find_filtered(
        query.status,
        query.refund_status,
        page.limit(),
        page.offset(),
        &deps.db_pool,
    )
    .await?;
    let total = Donation::count_filtered(query.status, query.refund_status, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

/// Approves a requested refund and takes the amount back off the campaign.
pub async fn approve_refund(
    id: DonationId,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<Donation> {
    admin
        .actor()
        .can(AdminCapability::ManagePayments)
        .check(deps)
        .await?;

    let mut tx = deps.db_pool.begin().await?;
    let current = Donation::lock(id, &mut tx)
        .await?
        .ok_or_else(|| ApiError::not_found("Donation"))?;
    if current.refund_status != RefundStatus::Requested {
        return Err(ApiError::bad_request("No pending refund request for this donation").into());
    }
    let donation = Donation::approve_refund(id, admin.user_id, &mut tx)
        .await?
        .ok_or_else(|| ApiError::bad_request("Donation can no longer be refunded"))?;
    Campaign::reverse_donation(donation.campaign_id, donation.amount, &mut tx).await?;
    tx.commit().await?;

    info!(donation_id = %id, amount = %donation.amount, "Refund approved");
    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::RefundApprove)
            .entity_type("donation")
            .entity_id(id.into_uuid())
            .old_values(json!({ "status": current.status, "refund_status": current.refund_status }))
            .new_values(json!({ "status": donation.status, "refund_status": donation.refund_status }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;
    if let Some(donor_id) = donation.donor_id {
        notifications::notify(
            donor_id,
            NotificationType::System,
            "İade onaylandı",
            &format!("{} {} tutarındaki bağışınızın iadesi onaylandı.", donation.amount, donation.currency),
            Some(json!({ "donation_id": donation.id })),
            deps,
        )
        .await;
    }

    Ok(donation)
}

pub async fn reject_refund(
    id: DonationId,
    input: RejectRefundInput,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<Donation> {
    admin
        .actor()
        .can(AdminCapability::ManagePayments)
        .check(deps)
        .await?;
    let reason = input.reason.trim();
    require_text("reason", reason)?;

    let donation = Donation::reject_refund(id, admin.user_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::bad_request("No pending refund request for this donation"))?;

    info!(donation_id = %id, "Refund rejected");
    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::RefundReject)
            .entity_type("donation")
            .entity_id(id.into_uuid())
            .old_values(json!({ "refund_status": RefundStatus::Requested }))
            .new_values(json!({ "refund_status": donation.refund_status, "reason": reason }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;
    if let Some(donor_id) = donation.donor_id {
        notifications::notify(
            donor_id,
            NotificationType::System,
            "İade talebi reddedildi",
            &format!("İade talebiniz reddedildi: {}", reason),
            Some(json!({ "donation_id": donation.id })),
            deps,
        )
        .await;
    }

    Ok(donation)
}
