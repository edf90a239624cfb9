//! Bank transfer references from pledge to match or expiry.

mod common;

use crate::common::*;
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;
use server_core::common::UserRole;
use server_core::domains::auth::User;
use server_core::domains::campaigns::Campaign;
use server_core::domains::donations::models::{BankTransferReference, BankTransferStatus};
use server_core::kernel::scheduled_tasks::run_job;
use test_context::test_context;

struct Setup {
    admin: User,
    donor: User,
    campaign: Campaign,
}

async fn setup(ctx: &TestHarness) -> Setup {
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let (owner, org) = create_approved_organization(&ctx.db_pool, &admin).await.unwrap();
    add_bank_account(&ctx.db_pool, &org).await.unwrap();
    let campaign = create_active_campaign(&ctx.db_pool, &org, &owner, &admin, Decimal::from(20000), 30)
        .await
        .unwrap();
    let donor = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    Setup { admin, donor, campaign }
}

async fn pledge(ctx: &TestHarness, s: &Setup, amount: &str) -> String {
    let res = ctx
        .post(
            "/api/v1/bank-transfers",
            Some(&ctx.token_for(&s.donor)),
            json!({ "campaign_id": s.campaign.id, "amount": amount, "sender_name": "Fatma Şahin" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(res.data()["iban"], json!("TR33 0006 1005 1978 6457 8413 26"));
    res.data()["reference_code"].as_str().unwrap().to_string()
}

async fn reference(ctx: &TestHarness, code: &str) -> BankTransferReference {
    BankTransferReference::find_by_code(code, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap()
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn matched_transfer_becomes_a_completed_donation(ctx: &TestHarness) {
    let s = setup(ctx).await;
    let code = pledge(ctx, &s, "750").await;

    // Admins may paste the code in lower case with stray spaces.
    let res = ctx
        .post(
            "/api/v1/admin/bank-transfers/match",
            Some(&ctx.token_for(&s.admin)),
            json!({ "reference_code": format!("  {}  ", code.to_lowercase()), "received_amount": "700" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["status"], json!("COMPLETED"));
    assert_eq!(res.data()["payment_method"], json!("BANK_TRANSFER"));
    assert!(res.data()["receipt"]["receipt_number"].is_string());

    let matched = reference(ctx, &code).await;
    assert_eq!(matched.status, BankTransferStatus::Matched);
    let campaign = Campaign::find_by_id_optional(s.campaign.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(campaign.collected_amount, Decimal::from(700));
    assert_eq!(campaign.donor_count, 1);

    let twice = ctx
        .post(
            "/api/v1/admin/bank-transfers/match",
            Some(&ctx.token_for(&s.admin)),
            json!({ "reference_code": code, "received_amount": "700" }),
        )
        .await;
    assert_eq!(twice.status, StatusCode::BAD_REQUEST);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn overdue_transfers_expire_and_cannot_be_matched(ctx: &TestHarness) {
    let s = setup(ctx).await;
    let code = pledge(ctx, &s, "400").await;
    sqlx::query(
        "UPDATE bank_transfer_references SET expires_at = NOW() - INTERVAL '1 hour' WHERE reference_code = $1",
    )
    .bind(&code)
    .execute(&ctx.db_pool)
    .await
    .unwrap();

    let result = run_job("bank_transfer_expiry", &ctx.deps).await.unwrap();
    assert!(result["expired"].as_u64().unwrap() >= 1);
    assert_eq!(reference(ctx, &code).await.status, BankTransferStatus::Expired);

    let res = ctx
        .post(
            "/api/v1/admin/bank-transfers/match",
            Some(&ctx.token_for(&s.admin)),
            json!({ "reference_code": code, "received_amount": "400" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn donors_can_cancel_their_pending_transfer(ctx: &TestHarness) {
    let s = setup(ctx).await;
    let code = pledge(ctx, &s, "250").await;

    let stranger = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    let res = ctx
        .post(
            &format!("/api/v1/bank-transfers/{}/cancel", code),
            Some(&ctx.token_for(&stranger)),
            json!({}),
        )
        .await;
    assert!(matches!(
        res.status,
        StatusCode::NOT_FOUND | StatusCode::FORBIDDEN
    ));

    let res = ctx
        .post(
            &format!("/api/v1/bank-transfers/{}/cancel", code),
            Some(&ctx.token_for(&s.donor)),
            json!({}),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["status"], json!("cancelled"));
}
