//! Background jobs run through the same dispatcher the scheduler uses.

mod common;

use crate::common::*;
use rust_decimal::Decimal;
use server_core::common::UserRole;
use server_core::domains::campaigns::{Campaign, CampaignStatus};
use server_core::kernel::scheduled_tasks::run_job;
use test_context::test_context;

async fn expire_campaign(ctx: &TestHarness, campaign: &Campaign, collected: i64) {
    sqlx::query(
        "UPDATE campaigns SET end_date = NOW() - INTERVAL '1 hour', collected_amount = $2 WHERE id = $1",
    )
    .bind(campaign.id)
    .bind(Decimal::from(collected))
    .execute(&ctx.db_pool)
    .await
    .unwrap();
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
async fn ended_campaign_near_target_completes(ctx: &TestHarness) {
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let (owner, org) = create_approved_organization(&ctx.db_pool, &admin).await.unwrap();
    let campaign = create_active_campaign(&ctx.db_pool, &org, &owner, &admin, Decimal::from(1000), 5)
        .await
        .unwrap();
    expire_campaign(ctx, &campaign, 850).await;

    run_job("campaign_status", &ctx.deps).await.unwrap();

    assert_eq!(reload(ctx, &campaign).await.status, CampaignStatus::Completed);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn ended_campaign_far_from_target_is_extended(ctx: &TestHarness) {
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let (owner, org) = create_approved_organization(&ctx.db_pool, &admin).await.unwrap();
    let campaign = create_active_campaign(&ctx.db_pool, &org, &owner, &admin, Decimal::from(1000), 5)
        .await
        .unwrap();
    expire_campaign(ctx, &campaign, 200).await;

    run_job("campaign_status", &ctx.deps).await.unwrap();

    let reloaded = reload(ctx, &campaign).await;
    assert_eq!(reloaded.status, CampaignStatus::Active);
    assert_eq!(reloaded.extension_count, 1);
    assert!(reloaded.end_date.unwrap() > chrono::Utc::now());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn cleanup_job_reports_counts(ctx: &TestHarness) {
    let result = run_job("cleanup", &ctx.deps).await.unwrap();
    assert!(result["refresh_tokens"].is_u64());
    assert!(result["audit_logs"].is_u64());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn unknown_job_name_is_an_error(ctx: &TestHarness) {
    assert!(run_job("no_such_job", &ctx.deps).await.is_err());
}
