//! Spending evidence: upload limits, review scoring and the deadline penalty.

mod common;

use crate::common::*;
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;
use server_core::common::UserRole;
use server_core::domains::auth::User;
use server_core::domains::campaigns::Campaign;
use server_core::domains::organizations::models::Organization;
use server_core::domains::transparency::TransparencyScore;
use server_core::kernel::scheduled_tasks::run_job;
use test_context::test_context;

struct Setup {
    admin: User,
    owner: User,
    org: Organization,
    campaign: Campaign,
}

/// Campaign that completed `days_ago` days ago having collected `collected`.
async fn completed_campaign(ctx: &TestHarness, days_ago: i64, collected: i64) -> Setup {
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let (owner, org) = create_approved_organization(&ctx.db_pool, &admin).await.unwrap();
    let campaign = create_active_campaign(&ctx.db_pool, &org, &owner, &admin, Decimal::from(1000), 10)
        .await
        .unwrap();
    sqlx::query(
        r#"
        UPDATE campaigns SET
            status = 'COMPLETED',
            completed_at = NOW() - make_interval(days => $2::int),
            collected_amount = $3
        WHERE id = $1
        "#,
    )
    .bind(campaign.id)
    .bind(days_ago as i32)
    .bind(Decimal::from(collected))
    .execute(&ctx.db_pool)
    .await
    .unwrap();
    Setup { admin, owner, org, campaign }
}

async fn upload(ctx: &TestHarness, s: &Setup, amount: &str) -> crate::common::TestResponse {
    ctx.post(
        "/api/v1/evidences",
        Some(&ctx.token_for(&s.owner)),
        json!({
            "campaign_id": s.campaign.id,
            "evidence_type": "INVOICE",
            "title": "Mont alımı faturası",
            "amount_spent": amount,
            "vendor_name": "Van Tekstil Ltd.",
            "documents": [{ "file_name": "fatura.pdf", "file_url": "https://cdn.example.org/fatura.pdf" }]
        }),
    )
    .await
}

async fn score(ctx: &TestHarness, org: &Organization) -> Decimal {
    TransparencyScore::find_by_organization(org.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap()
        .current_score
}

async fn approve(ctx: &TestHarness, s: &Setup, evidence_id: &str) {
    let res = ctx
        .post(
            &format!("/api/v1/admin/evidences/{}/review", evidence_id),
            Some(&ctx.token_for(&s.admin)),
            json!({ "approved": true }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["status"], json!("APPROVED"));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn evidence_total_cannot_exceed_collected(ctx: &TestHarness) {
    let s = completed_campaign(ctx, 1, 1000).await;

    let first = upload(ctx, &s, "600").await;
    assert_eq!(first.status, StatusCode::CREATED, "{}", first.body);
    assert_eq!(first.data()["documents"].as_array().unwrap().len(), 1);

    let over = upload(ctx, &s, "401").await;
    assert_eq!(over.status, StatusCode::BAD_REQUEST);
    assert_eq!(over.error_code(), Some("VALIDATION_ERROR"));

    let rest = upload(ctx, &s, "400").await;
    assert_eq!(rest.status, StatusCode::CREATED, "{}", rest.body);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn evidence_only_follows_completed_campaigns(ctx: &TestHarness) {
    let s = completed_campaign(ctx, 1, 500).await;
    sqlx::query("UPDATE campaigns SET status = 'ACTIVE', completed_at = NULL WHERE id = $1")
        .bind(s.campaign.id)
        .execute(&ctx.db_pool)
        .await
        .unwrap();

    let res = upload(ctx, &s, "100").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn on_time_approval_scores_more_than_late(ctx: &TestHarness) {
    let on_time = completed_campaign(ctx, 1, 1000).await;
    let res = upload(ctx, &on_time, "250").await;
    approve(ctx, &on_time, res.data()["id"].as_str().unwrap()).await;
    assert_eq!(score(ctx, &on_time.org).await, Decimal::from(55));

    // Deadline is 15 days after completion.
    let late = completed_campaign(ctx, 20, 1000).await;
    let res = upload(ctx, &late, "250").await;
    approve(ctx, &late, res.data()["id"].as_str().unwrap()).await;
    assert_eq!(score(ctx, &late.org).await, Decimal::from(53));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn rejection_needs_a_reason_and_costs_points(ctx: &TestHarness) {
    let s = completed_campaign(ctx, 1, 1000).await;
    let res = upload(ctx, &s, "250").await;
    let id = res.data()["id"].as_str().unwrap().to_string();
    let path = format!("/api/v1/admin/evidences/{}/review", id);
    let admin_token = ctx.token_for(&s.admin);

    let res = ctx.post(&path, Some(&admin_token), json!({ "approved": false })).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = ctx
        .post(
            &path,
            Some(&admin_token),
            json!({ "approved": false, "rejection_reason": "Fatura okunmuyor" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["status"], json!("REJECTED"));
    assert!(score(ctx, &s.org).await < Decimal::from(50));

    let again = ctx.post(&path, Some(&admin_token), json!({ "approved": true })).await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn missed_deadline_is_penalized_once(ctx: &TestHarness) {
    let s = completed_campaign(ctx, 30, 1000).await;

    run_job("evidence_deadline_penalty", &ctx.deps).await.unwrap();
    run_job("evidence_deadline_penalty", &ctx.deps).await.unwrap();

    assert_eq!(score(ctx, &s.org).await, Decimal::from(40));
    let penalties: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM transparency_score_history
        WHERE campaign_id = $1 AND change_reason = 'EVIDENCE_DEADLINE_MISSED'
        "#,
    )
    .bind(s.campaign.id)
    .fetch_one(&ctx.db_pool)
    .await
    .unwrap();
    assert_eq!(penalties, 1);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn fully_evidenced_campaign_escapes_the_penalty(ctx: &TestHarness) {
    let s = completed_campaign(ctx, 1, 300).await;
    let res = upload(ctx, &s, "300").await;
    approve(ctx, &s, res.data()["id"].as_str().unwrap()).await;
    sqlx::query("UPDATE campaigns SET completed_at = NOW() - INTERVAL '30 days' WHERE id = $1")
        .bind(s.campaign.id)
        .execute(&ctx.db_pool)
        .await
        .unwrap();

    run_job("evidence_deadline_penalty", &ctx.deps).await.unwrap();

    assert_eq!(score(ctx, &s.org).await, Decimal::from(55));
}
