//! Owner-driven campaign transitions, extensions and campaign page content.

mod common;

use crate::common::*;
use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::json;
use server_core::common::UserRole;
use server_core::domains::auth::User;
use server_core::domains::campaigns::{Campaign, CampaignStatus};
use server_core::domains::notifications::models::Notification;
use server_core::domains::organizations::models::Organization;
use server_core::domains::transparency::TransparencyScore;
use test_context::test_context;
use uuid::Uuid;

struct Setup {
    owner: User,
    org: Organization,
    campaign: Campaign,
}

async fn setup(ctx: &TestHarness) -> Setup {
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let (owner, org) = create_approved_organization(&ctx.db_pool, &admin).await.unwrap();
    let campaign = create_active_campaign(&ctx.db_pool, &org, &owner, &admin, Decimal::from(8000), 20)
        .await
        .unwrap();
    Setup { owner, org, campaign }
}

async fn score(ctx: &TestHarness, org: &Organization) -> Decimal {
    TransparencyScore::find_by_organization(org.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap()
        .current_score
}

async fn transition(ctx: &TestHarness, s: &Setup, action: &str, token: &str) -> TestResponse {
    ctx.post(
        &format!("/api/v1/campaigns/{}/{}", s.campaign.id, action),
        Some(token),
        json!({}),
    )
    .await
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn owner_pauses_resumes_and_cancels(ctx: &TestHarness) {
    let s = setup(ctx).await;
    let token = ctx.token_for(&s.owner);

    let res = transition(ctx, &s, "pause", &token).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["status"], json!("PAUSED"));

    let res = transition(ctx, &s, "pause", &token).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = transition(ctx, &s, "resume", &token).await;
    assert_eq!(res.data()["status"], json!("ACTIVE"));

    let res = transition(ctx, &s, "cancel", &token).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["status"], json!("CANCELLED"));
    assert_eq!(score(ctx, &s.org).await, Decimal::from(48));

    // Terminal.
    let res = transition(ctx, &s, "resume", &token).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn completing_early_scores_and_stamps_the_campaign(ctx: &TestHarness) {
    let s = setup(ctx).await;
    let res = transition(ctx, &s, "complete", &ctx.token_for(&s.owner)).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["status"], json!("COMPLETED"));
    assert!(res.data()["completed_at"].is_string());
    assert_eq!(score(ctx, &s.org).await, Decimal::from(53));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn only_the_owner_moves_a_campaign(ctx: &TestHarness) {
    let s = setup(ctx).await;
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let (other_owner, _) = create_approved_organization(&ctx.db_pool, &admin).await.unwrap();

    let res = transition(ctx, &s, "pause", &ctx.token_for(&other_owner)).await;
    assert!(matches!(
        res.status,
        StatusCode::NOT_FOUND | StatusCode::FORBIDDEN
    ));
    let reloaded = Campaign::find_by_id_optional(s.campaign.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status, CampaignStatus::Active);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn extension_from_a_stale_count_is_refused(ctx: &TestHarness) {
    let s = setup(ctx).await;

    let first = Campaign::extend_end_date(s.campaign.id, 7, 0, 2, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(first.unwrap().extension_count, 1);

    let stale = Campaign::extend_end_date(s.campaign.id, 7, 0, 2, &ctx.db_pool)
        .await
        .unwrap();
    assert!(stale.is_none());

    let second = Campaign::extend_end_date(s.campaign.id, 7, 1, 2, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(second.unwrap().extension_count, 2);
    let capped = Campaign::extend_end_date(s.campaign.id, 7, 2, 2, &ctx.db_pool)
        .await
        .unwrap();
    assert!(capped.is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn unknown_category_leaves_the_campaign_untouched(ctx: &TestHarness) {
    let s = setup(ctx).await;
    let res = ctx
        .request(
            Method::PUT,
            &format!("/api/v1/campaigns/{}", s.campaign.id),
            Some(&ctx.token_for(&s.owner)),
            Some(json!({
                "title": "Yeni başlık",
                "category_ids": [Uuid::new_v4()]
            })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), Some("VALIDATION_ERROR"));

    let reloaded = Campaign::find_by_id_optional(s.campaign.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.title, s.campaign.title);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn updates_reach_followers_who_did_not_opt_out(ctx: &TestHarness) {
    let s = setup(ctx).await;
    let listening = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    let muted = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    for follower in [&listening, &muted] {
        let res = ctx
            .post(
                &format!("/api/v1/campaigns/{}/follow", s.campaign.id),
                Some(&ctx.token_for(follower)),
                json!({}),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    }
    let res = ctx
        .request(
            Method::PUT,
            "/api/v1/users/me/preferences",
            Some(&ctx.token_for(&muted)),
            Some(json!({ "notify_on_campaign_update": false })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["notify_on_campaign_update"], json!(false));

    let res = ctx
        .post(
            &format!("/api/v1/campaigns/{}/updates", s.campaign.id),
            Some(&ctx.token_for(&s.owner)),
            json!({
                "title": "İlk 100 mont dağıtıldı",
                "content": "Erciş'teki üç okulda dağıtım tamamlandı.",
                "image_url": "https://cdn.example.org/dagitim.jpg"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);

    let listed = ctx
        .get(&format!("/api/v1/campaigns/{}/updates", s.campaign.id), None)
        .await;
    assert_eq!(listed.data()["total_items"], json!(1));

    let heard = Notification::count_for_user(listening.id, false, &ctx.db_pool)
        .await
        .unwrap();
    let silent = Notification::count_for_user(muted.id, false, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(heard, 1);
    assert_eq!(silent, 0);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn strangers_cannot_post_updates(ctx: &TestHarness) {
    let s = setup(ctx).await;
    let donor = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    let res = ctx
        .post(
            &format!("/api/v1/campaigns/{}/updates", s.campaign.id),
            Some(&ctx.token_for(&donor)),
            json!({ "title": "Sahte", "content": "Sahte içerik" }),
        )
        .await;
    assert!(matches!(
        res.status,
        StatusCode::NOT_FOUND | StatusCode::FORBIDDEN
    ));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn gallery_images_can_be_reordered(ctx: &TestHarness) {
    let s = setup(ctx).await;
    let token = ctx.token_for(&s.owner);
    let mut ids = Vec::new();
    for n in 1..=3 {
        let res = ctx
            .post(
                &format!("/api/v1/campaigns/{}/images", s.campaign.id),
                Some(&token),
                json!({ "image_url": format!("https://cdn.example.org/foto-{}.jpg", n) }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        ids.push(res.data()["id"].clone());
    }

    let reversed: Vec<_> = ids.iter().rev().cloned().collect();
    let res = ctx
        .request(
            Method::PUT,
            &format!("/api/v1/campaigns/{}/images/reorder", s.campaign.id),
            Some(&token),
            Some(json!({ "image_ids": reversed })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let order: Vec<_> = res.data().as_array().unwrap().iter().map(|i| i["id"].clone()).collect();
    assert_eq!(order, reversed);

    // Every image must be named exactly once.
    let res = ctx
        .request(
            Method::PUT,
            &format!("/api/v1/campaigns/{}/images/reorder", s.campaign.id),
            Some(&token),
            Some(json!({ "image_ids": [ids[0], ids[0], ids[1]] })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = ctx
        .request(
            Method::DELETE,
            &format!("/api/v1/campaigns/{}/images/{}", s.campaign.id, ids[1].as_str().unwrap()),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let listed = ctx
        .get(&format!("/api/v1/campaigns/{}/images", s.campaign.id), None)
        .await;
    assert_eq!(listed.data().as_array().unwrap().len(), 2);
}
