//! Card donations, checkout and receipts end to end.

mod common;

use std::str::FromStr;

use crate::common::*;
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;
use server_core::common::UserRole;
use server_core::domains::campaigns::Campaign;
use server_core::kernel::MockPaymentGateway;
use test_context::test_context;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

struct Setup {
    donor: server_core::domains::auth::User,
    campaign: Campaign,
}

async fn setup(ctx: &TestHarness) -> Setup {
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let (owner, org) = create_approved_organization(&ctx.db_pool, &admin).await.unwrap();
    let campaign = create_active_campaign(&ctx.db_pool, &org, &owner, &admin, dec("10000"), 20)
        .await
        .unwrap();
    let donor = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    Setup { donor, campaign }
}

async fn reload(ctx: &TestHarness, campaign: &Campaign) -> Campaign {
    Campaign::find_by_id_optional(campaign.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap()
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn card_donation_updates_campaign_and_issues_receipt(ctx: &TestHarness) {
    let s = setup(ctx).await;
    let token = ctx.token_for(&s.donor);

    let res = ctx
        .post(
            "/api/v1/donations",
            Some(&token),
            json!({
                "campaign_id": s.campaign.id,
                "amount": "250.00",
                "donor_message": "Kolay gelsin",
                "card": test_card()
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(res.data()["status"], json!("COMPLETED"));
    let receipt_number = res.data()["receipt"]["receipt_number"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(ctx.gateway.charge_count(), 1);

    let campaign = reload(ctx, &s.campaign).await;
    assert_eq!(campaign.collected_amount, dec("250"));
    assert_eq!(campaign.donor_count, 1);

    let verify = ctx
        .get(&format!("/api/v1/receipts/verify/{}", receipt_number), None)
        .await;
    assert_eq!(verify.status, StatusCode::OK);
    assert_eq!(verify.data()["valid"], json!(true));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn declined_card_leaves_campaign_untouched() {
    let ctx = TestHarness::with_gateway(MockPaymentGateway::new().with_decline("Yetersiz bakiye"))
        .await
        .unwrap();
    let s = setup(&ctx).await;
    let token = ctx.token_for(&s.donor);

    let res = ctx
        .post(
            "/api/v1/donations",
            Some(&token),
            json!({ "campaign_id": s.campaign.id, "amount": "100", "card": test_card() }),
        )
        .await;
    assert_eq!(res.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(res.error_code(), Some("PAYMENT_FAILED"));

    let campaign = reload(&ctx, &s.campaign).await;
    assert_eq!(campaign.collected_amount, Decimal::ZERO);
    assert_eq!(campaign.donor_count, 0);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn checkout_charges_the_basket_total_once(ctx: &TestHarness) {
    let s = setup(ctx).await;
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let (owner, org) = create_approved_organization(&ctx.db_pool, &admin).await.unwrap();
    let second = create_active_campaign(&ctx.db_pool, &org, &owner, &admin, dec("5000"), 10)
        .await
        .unwrap();
    let token = ctx.token_for(&s.donor);

    let res = ctx
        .post(
            "/api/v1/donations/checkout",
            Some(&token),
            json!({
                "items": [
                    { "campaign_id": s.campaign.id, "amount": "150" },
                    { "campaign_id": second.id, "amount": "350" }
                ],
                "card": test_card()
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(res.data()["donations"].as_array().unwrap().len(), 2);
    assert_eq!(ctx.gateway.charge_count(), 1);
    assert_eq!(ctx.gateway.total_charged(), dec("500"));

    assert_eq!(reload(ctx, &s.campaign).await.collected_amount, dec("150"));
    assert_eq!(reload(ctx, &second).await.collected_amount, dec("350"));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn unknown_receipt_is_reported_invalid(ctx: &TestHarness) {
    let res = ctx.get("/api/v1/receipts/verify/RCPT-2020-999999", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["valid"], json!(false));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn donors_only_see_their_own_donations(ctx: &TestHarness) {
    let s = setup(ctx).await;
    let token = ctx.token_for(&s.donor);
    let res = ctx
        .post(
            "/api/v1/donations",
            Some(&token),
            json!({ "campaign_id": s.campaign.id, "amount": "75", "card": test_card() }),
        )
        .await;
    let donation_id = res.data()["id"].as_str().unwrap().to_string();

    let stranger = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    let other = ctx
        .get(
            &format!("/api/v1/donations/{}", donation_id),
            Some(&ctx.token_for(&stranger)),
        )
        .await;
    assert!(matches!(
        other.status,
        StatusCode::NOT_FOUND | StatusCode::FORBIDDEN
    ));

    let mine = ctx.get("/api/v1/donations/me", Some(&token)).await;
    assert_eq!(mine.status, StatusCode::OK);
    assert_eq!(mine.data()["total_items"], json!(1));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn guest_checkout_with_a_closed_campaign_charges_nothing(ctx: &TestHarness) {
    let s = setup(ctx).await;
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let (owner, org) = create_approved_organization(&ctx.db_pool, &admin).await.unwrap();
    let closed = create_active_campaign(&ctx.db_pool, &org, &owner, &admin, dec("5000"), 10)
        .await
        .unwrap();
    sqlx::query("UPDATE campaigns SET status = 'PAUSED' WHERE id = $1")
        .bind(closed.id)
        .execute(&ctx.db_pool)
        .await
        .unwrap();

    let res = ctx
        .post(
            "/api/v1/guest/checkout",
            None,
            json!({
                "guest_name": "Mehmet Kaya",
                "guest_email": "mehmet.kaya@example.com",
                "items": [
                    { "campaign_id": s.campaign.id, "amount": "100" },
                    { "campaign_id": closed.id, "amount": "100" }
                ],
                "card": test_card()
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST, "{}", res.body);
    assert_eq!(ctx.gateway.charge_count(), 0);
    assert_eq!(reload(ctx, &s.campaign).await.collected_amount, Decimal::ZERO);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn approved_refund_takes_the_gift_back_off_the_campaign(ctx: &TestHarness) {
    let s = setup(ctx).await;
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let token = ctx.token_for(&s.donor);
    let res = ctx
        .post(
            "/api/v1/donations",
            Some(&token),
            json!({ "campaign_id": s.campaign.id, "amount": "300", "card": test_card() }),
        )
        .await;
    let donation_id = res.data()["id"].as_str().unwrap().to_string();
    assert_eq!(reload(ctx, &s.campaign).await.donor_count, 1);

    let res = ctx
        .post(
            &format!("/api/v1/donations/{}/refund", donation_id),
            Some(&token),
            json!({ "reason": "Yanlış kampanyaya bağış yaptım" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["refund_status"], json!("requested"));

    let again = ctx
        .post(
            &format!("/api/v1/donations/{}/refund", donation_id),
            Some(&token),
            json!({ "reason": "Tekrar" }),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let res = ctx
        .post(
            &format!("/api/v1/admin/donations/{}/refund/approve", donation_id),
            Some(&ctx.token_for(&admin)),
            json!({}),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["status"], json!("REFUNDED"));
    assert_eq!(res.data()["refund_status"], json!("approved"));

    let campaign = reload(ctx, &s.campaign).await;
    assert_eq!(campaign.collected_amount, Decimal::ZERO);
    assert_eq!(campaign.donor_count, 0);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn refunds_need_a_reason(ctx: &TestHarness) {
    let s = setup(ctx).await;
    let token = ctx.token_for(&s.donor);
    let res = ctx
        .post(
            "/api/v1/donations",
            Some(&token),
            json!({ "campaign_id": s.campaign.id, "amount": "50", "card": test_card() }),
        )
        .await;
    let donation_id = res.data()["id"].as_str().unwrap().to_string();

    let res = ctx
        .post(
            &format!("/api/v1/donations/{}/refund", donation_id),
            Some(&token),
            json!({ "reason": "   " }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), Some("VALIDATION_ERROR"));
}
