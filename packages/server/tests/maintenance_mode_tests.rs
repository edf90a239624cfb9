//! Maintenance mode is a platform-wide switch, so it lives in its own test
//! binary with its own database.

mod common;

use crate::common::*;
use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::json;
use server_core::common::UserRole;
use server_core::kernel::scheduled_tasks::run_job;
use test_context::test_context;

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn maintenance_refuses_new_money_until_switched_off(ctx: &TestHarness) {
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let (owner, org) = create_approved_organization(&ctx.db_pool, &admin).await.unwrap();
    add_bank_account(&ctx.db_pool, &org).await.unwrap();
    let campaign = create_active_campaign(&ctx.db_pool, &org, &owner, &admin, Decimal::from(5000), 15)
        .await
        .unwrap();
    let donor = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    let token = ctx.token_for(&donor);
    let admin_token = ctx.token_for(&admin);

    let res = ctx
        .request(
            Method::PUT,
            "/api/v1/admin/settings/maintenance_mode",
            Some(&admin_token),
            Some(json!({ "value": true })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);

    let res = ctx
        .post(
            "/api/v1/donations",
            Some(&token),
            json!({ "campaign_id": campaign.id, "amount": "100", "card": test_card() }),
        )
        .await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.error_code(), Some("SERVICE_UNAVAILABLE"));

    let res = ctx
        .post(
            "/api/v1/bank-transfers",
            Some(&token),
            json!({ "campaign_id": campaign.id, "amount": "100" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);

    let res = ctx
        .post(
            "/api/v1/guest/checkout",
            None,
            json!({
                "guest_name": "Zeynep Arslan",
                "guest_email": "zeynep@example.com",
                "items": [{ "campaign_id": campaign.id, "amount": "100" }],
                "card": test_card()
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);

    let stats = run_job("recurring_donations", &ctx.deps).await.unwrap();
    assert_eq!(stats["charged"], json!(0));
    assert_eq!(ctx.gateway.charge_count(), 0);

    set_setting(&ctx.db_pool, "maintenance_mode", json!(false)).await.unwrap();

    let res = ctx
        .post(
            "/api/v1/donations",
            Some(&token),
            json!({ "campaign_id": campaign.id, "amount": "100", "card": test_card() }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(ctx.gateway.charge_count(), 1);
}
