//! Request and response shapes for the donations API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::utils::masking::ANONYMOUS_DONOR_NAME;
use crate::common::{ApiError, BankTransferId, CampaignId, DonationId, OrganizationId};
use crate::domains::donations::models::{
    Donation, DonationReceipt, DonationStatus, RecurringDonation, RecurringFrequency,
    RefundStatus,
};
use crate::kernel::CardDetails;

pub const MAX_CHECKOUT_ITEMS: usize = 20;
pub const MAX_DONOR_MESSAGE_LENGTH: usize = 500;
pub const DEFAULT_CURRENCY: &str = "TRY";

// =============================================================================
// Inputs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct DonateInput {
    pub campaign_id: CampaignId,
    pub amount: Decimal,
    #[serde(default)]
    pub is_anonymous: bool,
    pub donor_message: Option<String>,
    pub donor_display_name: Option<String>,
    pub card: CardDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutItem {
    pub campaign_id: CampaignId,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutInput {
    pub items: Vec<CheckoutItem>,
    #[serde(default)]
    pub is_anonymous: bool,
    pub donor_message: Option<String>,
    pub card: CardDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuestCheckoutInput {
    pub guest_name: String,
    pub guest_email: String,
    pub items: Vec<CheckoutItem>,
    #[serde(default)]
    pub is_anonymous: bool,
    pub donor_message: Option<String>,
    pub card: CardDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundRequestInput {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectRefundInput {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminDonationQuery {
    pub status: Option<DonationStatus>,
    pub refund_status: Option<RefundStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBankTransferInput {
    pub campaign_id: CampaignId,
    pub amount: Decimal,
    pub sender_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchBankTransferInput {
    pub reference_code: String,
    pub received_amount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecurringInput {
    pub campaign_id: Option<CampaignId>,
    pub organization_id: Option<OrganizationId>,
    pub amount: Decimal,
    #[serde(default = "default_frequency")]
    pub frequency: RecurringFrequency,
    pub card: CardDetails,
}

fn default_frequency() -> RecurringFrequency {
    RecurringFrequency::Monthly
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRecurringInput {
    pub amount: Option<Decimal>,
    pub frequency: Option<RecurringFrequency>,
}

// =============================================================================
// Views
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DonationConfirmation {
    #[serde(flatten)]
    pub donation: Donation,
    pub receipt: DonationReceipt,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutLine {
    pub donation_id: DonationId,
    pub receipt_number: String,
    pub campaign_id: CampaignId,
    pub campaign_title: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResult {
    pub donations: Vec<CheckoutLine>,
    pub total_amount: Decimal,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_email: Option<String>,
}

/// Public answer to "is this receipt real?". Unknown numbers come back with
/// `valid: false` and no details.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReceiptVerification {
    pub valid: bool,
    pub receipt_number: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub campaign_title: Option<String>,
    pub organization_name: Option<String>,
    pub donor_name: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BankTransferInstructions {
    pub id: BankTransferId,
    pub reference_code: String,
    pub campaign_id: CampaignId,
    pub campaign_title: String,
    pub expected_amount: Decimal,
    pub currency: String,
    pub bank_name: String,
    pub branch_name: Option<String>,
    pub account_holder: String,
    pub iban: String,
    pub expires_at: DateTime<Utc>,
    pub instructions: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecurringSummary {
    pub items: Vec<RecurringDonation>,
    pub total_monthly_amount: Decimal,
    pub total_active: i64,
}

impl RecurringSummary {
    pub fn new(items: Vec<RecurringDonation>) -> Self {
        use crate::domains::donations::models::RecurringStatus;

        let active: Vec<&RecurringDonation> = items
            .iter()
            .filter(|p| p.status == RecurringStatus::Active)
            .collect();
        let total_monthly_amount = active
            .iter()
            .map(|p| p.frequency.monthly_equivalent(p.amount))
            .sum();
        let total_active = active.len() as i64;
        Self {
            items,
            total_monthly_amount,
            total_active,
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

pub fn transfer_instructions(reference_code: &str, validity_days: i64) -> String {
    format!(
        "Lütfen havale/EFT yaparken açıklama kısmına '{}' referans kodunu yazınız. Bu kod {} gün geçerlidir.",
        reference_code, validity_days
    )
}

/// Name printed on receipts and shown to the organization.
pub fn donor_name(is_anonymous: bool, display_name: Option<&str>, fallback: &str) -> String {
    if is_anonymous {
        return ANONYMOUS_DONOR_NAME.to_string();
    }
    display_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

pub fn check_positive(field: &str, amount: Decimal) -> Result<(), ApiError> {
    if amount <= Decimal::ZERO {
        return Err(ApiError::validation(field, "Amount must be greater than zero"));
    }
    Ok(())
}

/// `min <= amount <= max`, with the limits spelled out in the message.
pub fn check_amount_range(
    field: &str,
    amount: Decimal,
    min: Decimal,
    max: Decimal,
) -> Result<(), ApiError> {
    check_positive(field, amount)?;
    if amount < min {
        return Err(ApiError::validation(
            field,
            format!("Minimum donation amount is {}", min),
        ));
    }
    if amount > max {
        return Err(ApiError::validation(
            field,
            format!("Maximum donation amount is {}", max),
        ));
    }
    Ok(())
}

pub fn check_item_count(items: &[CheckoutItem]) -> Result<(), ApiError> {
    if items.is_empty() {
        return Err(ApiError::validation("items", "At least one item is required"));
    }
    if items.len() > MAX_CHECKOUT_ITEMS {
        return Err(ApiError::validation(
            "items",
            format!("At most {} items per checkout", MAX_CHECKOUT_ITEMS),
        ));
    }
    Ok(())
}
