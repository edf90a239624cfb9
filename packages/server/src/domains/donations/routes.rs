use axum::extract::{Extension, Path, Query};
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::common::{
    created, ok, ApiResult, AuthUser, CampaignId, CreatedResult, DonationId, PageParams, Paged,
    RecurringDonationId, RequestMeta,
};
use crate::domains::donations::activities;
use crate::domains::donations::data::{
    AdminDonationQuery, BankTransferInstructions, CheckoutInput, CheckoutResult,
    CreateBankTransferInput, CreateRecurringInput, DonateInput, DonationConfirmation,
    GuestCheckoutInput, MatchBankTransferInput, ReceiptVerification, RecurringSummary,
    RefundRequestInput, RejectRefundInput, UpdateRecurringInput,
};
use crate::domains::donations::models::{
    BankTransferReference, Donation, DonationReceipt, PublicDonor, RecurringDonation,
};
use crate::server::app::AppState;
use crate::server::extractors::{AdminUser, MaybeAuthUser};

pub fn router() -> Router {
    Router::new()
        .route("/donations", post(donate))
        .route("/donations/checkout", post(checkout))
        .route("/guest/checkout", post(guest_checkout))
        .route("/donations/me", get(my_donations))
        .route("/donations/:id", get(get_donation))
        .route("/donations/:id/receipt", get(get_receipt))
        .route("/donations/:id/refund", post(request_refund))
        .route("/receipts/verify/:number", get(verify_receipt))
        .route("/campaigns/:id/donors", get(campaign_donors))
        .route("/campaigns/:id/donations", get(campaign_donations))
        .route("/organizations/me/donations", get(organization_donations))
        .route("/bank-transfers", post(create_bank_transfer))
        .route("/bank-transfers/me", get(my_bank_transfers))
        .route("/bank-transfers/:code", get(get_bank_transfer))
        .route("/bank-transfers/:code/cancel", post(cancel_bank_transfer))
        .route("/recurring-donations", post(create_recurring))
        .route("/recurring-donations/me", get(my_recurring))
        .route(
            "/recurring-donations/:id",
            put(update_recurring),
        )
        .route("/recurring-donations/:id/pause", post(pause_recurring))
        .route("/recurring-donations/:id/resume", post(resume_recurring))
        .route("/recurring-donations/:id/cancel", post(cancel_recurring))
        .route("/admin/donations", get(admin_donations))
        .route("/admin/donations/:id/refund/approve", post(admin_approve_refund))
        .route("/admin/donations/:id/refund/reject", post(admin_reject_refund))
        .route("/admin/bank-transfers", get(admin_bank_transfers))
        .route("/admin/bank-transfers/match", post(admin_match_transfer))
}

// =============================================================================
// Donations
// =============================================================================

async fn donate(
    Extension(state): Extension<AppState>,
    MaybeAuthUser(donor): MaybeAuthUser,
    meta: RequestMeta,
    Json(input): Json<DonateInput>,
) -> CreatedResult<DonationConfirmation> {
    created(activities::donate(input, donor.as_ref(), &meta, &state.deps).await?)
}

async fn checkout(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    meta: RequestMeta,
    Json(input): Json<CheckoutInput>,
) -> CreatedResult<CheckoutResult> {
    created(activities::checkout(input, &user, &meta, &state.deps).await?)
}

async fn guest_checkout(
    Extension(state): Extension<AppState>,
    meta: RequestMeta,
    Json(input): Json<GuestCheckoutInput>,
) -> CreatedResult<CheckoutResult> {
    created(activities::guest_checkout(input, &meta, &state.deps).await?)
}

async fn my_donations(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Donation>> {
    ok(activities::my_donations(page, &user, &state.deps).await?)
}

async fn get_donation(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<DonationId>,
) -> ApiResult<Donation> {
    ok(activities::get_donation(id, &user, &state.deps).await?)
}

async fn get_receipt(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<DonationId>,
) -> ApiResult<DonationReceipt> {
    ok(activities::get_receipt(id, &user, &state.deps).await?)
}

async fn request_refund(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<DonationId>,
    Json(input): Json<RefundRequestInput>,
) -> ApiResult<Donation> {
    ok(activities::request_refund(id, input, &user, &state.deps).await?)
}

async fn verify_receipt(
    Extension(state): Extension<AppState>,
    Path(number): Path<String>,
) -> ApiResult<ReceiptVerification> {
    ok(activities::verify_receipt(&number, &state.deps).await?)
}

async fn campaign_donors(
    Extension(state): Extension<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<CampaignId>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<PublicDonor>> {
    ok(activities::campaign_donors(id, page, viewer.as_ref(), &state.deps).await?)
}

async fn campaign_donations(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Donation>> {
    ok(activities::campaign_donations(id, page, &user, &state.deps).await?)
}

async fn organization_donations(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Donation>> {
    ok(activities::organization_donations(page, &user, &state.deps).await?)
}

// =============================================================================
// Bank transfers
// =============================================================================

async fn create_bank_transfer(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(input): Json<CreateBankTransferInput>,
) -> CreatedResult<BankTransferInstructions> {
    created(activities::create_bank_transfer(input, &user, &state.deps).await?)
}

async fn my_bank_transfers(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<BankTransferReference>> {
    ok(activities::my_bank_transfers(&user, &state.deps).await?)
}

async fn get_bank_transfer(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(code): Path<String>,
) -> ApiResult<BankTransferReference> {
    ok(activities::get_bank_transfer(&code, &user, &state.deps).await?)
}

async fn cancel_bank_transfer(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(code): Path<String>,
) -> ApiResult<BankTransferReference> {
    ok(activities::cancel_bank_transfer(&code, &user, &state.deps).await?)
}

// =============================================================================
// Recurring donations
// =============================================================================

async fn create_recurring(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(input): Json<CreateRecurringInput>,
) -> CreatedResult<RecurringDonation> {
    created(activities::create_recurring(input, &user, &state.deps).await?)
}

async fn my_recurring(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<RecurringSummary> {
    ok(activities::my_recurring(&user, &state.deps).await?)
}

async fn update_recurring(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<RecurringDonationId>,
    Json(input): Json<UpdateRecurringInput>,
) -> ApiResult<RecurringDonation> {
    ok(activities::update_recurring(id, input, &user, &state.deps).await?)
}

async fn pause_recurring(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<RecurringDonationId>,
) -> ApiResult<RecurringDonation> {
    ok(activities::pause_recurring(id, &user, &state.deps).await?)
}

async fn resume_recurring(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<RecurringDonationId>,
) -> ApiResult<RecurringDonation> {
    ok(activities::resume_recurring(id, &user, &state.deps).await?)
}

async fn cancel_recurring(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<RecurringDonationId>,
) -> ApiResult<RecurringDonation> {
    ok(activities::cancel_recurring(id, &user, &state.deps).await?)
}

// =============================================================================
// Admin
// =============================================================================

async fn admin_donations(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    Query(query): Query<AdminDonationQuery>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Donation>> {
    ok(activities::admin_list_donations(query, page, &admin, &state.deps).await?)
}

async fn admin_approve_refund(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Path(id): Path<DonationId>,
) -> ApiResult<Donation> {
    ok(activities::approve_refund(id, &admin, &meta, &state.deps).await?)
}

async fn admin_reject_refund(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Path(id): Path<DonationId>,
    Json(input): Json<RejectRefundInput>,
) -> ApiResult<Donation> {
    ok(activities::reject_refund(id, input, &admin, &meta, &state.deps).await?)
}

async fn admin_bank_transfers(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<BankTransferReference>> {
    ok(activities::admin_pending_transfers(page, &admin, &state.deps).await?)
}

async fn admin_match_transfer(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Json(input): Json<MatchBankTransferInput>,
) -> ApiResult<DonationConfirmation> {
    ok(activities::match_bank_transfer(input, &admin, &meta, &state.deps).await?)
}
