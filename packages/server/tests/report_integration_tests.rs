//! Abuse reports: filing, duplicates and moderation outcomes.

mod common;

use std::str::FromStr;

use crate::common::*;
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;
use server_core::common::UserRole;
use server_core::domains::transparency::TransparencyScore;
use test_context::test_context;

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn second_open_report_on_same_target_conflicts(ctx: &TestHarness) {
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let (_, org) = create_approved_organization(&ctx.db_pool, &admin).await.unwrap();
    let reporter = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    let token = ctx.token_for(&reporter);

    let body = json!({
        "report_type": "MISLEADING_INFO",
        "entity_type": "ORGANIZATION",
        "entity_id": org.id,
        "reason": "Faaliyet raporları eksik"
    });
    let first = ctx.post("/api/v1/reports", Some(&token), body.clone()).await;
    assert_eq!(first.status, StatusCode::CREATED, "{}", first.body);
    assert_eq!(first.data()["status"], json!("PENDING"));
    assert_eq!(first.data()["priority"], json!("MEDIUM"));

    let second = ctx.post("/api/v1/reports", Some(&token), body).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn reporting_a_missing_target_is_not_found(ctx: &TestHarness) {
    let reporter = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    let res = ctx
        .post(
            "/api/v1/reports",
            Some(&ctx.token_for(&reporter)),
            json!({
                "report_type": "SPAM",
                "entity_type": "CAMPAIGN",
                "entity_id": uuid::Uuid::new_v4(),
                "reason": "Sahte kampanya"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn resolved_fraud_report_lowers_transparency_score(ctx: &TestHarness) {
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let (owner, org) = create_approved_organization(&ctx.db_pool, &admin).await.unwrap();
    let campaign = create_active_campaign(
        &ctx.db_pool,
        &org,
        &owner,
        &admin,
        Decimal::from(20_000),
        30,
    )
    .await
    .unwrap();
    let reporter = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();

    let created = ctx
        .post(
            "/api/v1/reports",
            Some(&ctx.token_for(&reporter)),
            json!({
                "report_type": "FRAUD",
                "entity_type": "CAMPAIGN",
                "entity_id": campaign.id,
                "reason": "Toplanan para başka amaçla kullanılıyor",
                "evidence_urls": ["https://example.org/kanit.jpg"]
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert_eq!(created.data()["priority"], json!("HIGH"));
    let report_id = created.data()["id"].as_str().unwrap().to_string();

    let admin_token = ctx.token_for(&admin);
    let resolved = ctx
        .post(
            &format!("/api/v1/admin/reports/{}/resolve", report_id),
            Some(&admin_token),
            json!({ "resolution": "RESOLVED", "resolution_notes": "Belgeler incelendi" }),
        )
        .await;
    assert_eq!(resolved.status, StatusCode::OK, "{}", resolved.body);
    assert_eq!(resolved.data()["status"], json!("RESOLVED"));

    let score = TransparencyScore::find_by_organization(org.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(score.current_score, Decimal::from_str("35").unwrap());

    let again = ctx
        .post(
            &format!("/api/v1/admin/reports/{}/resolve", report_id),
            Some(&admin_token),
            json!({ "resolution": "DISMISSED", "resolution_notes": "Tekrar" }),
        )
        .await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn dismissed_report_keeps_score(ctx: &TestHarness) {
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let (_, org) = create_approved_organization(&ctx.db_pool, &admin).await.unwrap();
    let reporter = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();

    let created = ctx
        .post(
            "/api/v1/reports",
            Some(&ctx.token_for(&reporter)),
            json!({
                "report_type": "FRAUD",
                "entity_type": "ORGANIZATION",
                "entity_id": org.id,
                "reason": "Şüpheli"
            }),
        )
        .await;
    let report_id = created.data()["id"].as_str().unwrap().to_string();

    let res = ctx
        .post(
            &format!("/api/v1/admin/reports/{}/resolve", report_id),
            Some(&ctx.token_for(&admin)),
            json!({ "resolution": "DISMISSED", "resolution_notes": "Kanıt yok" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);

    let score = TransparencyScore::find_by_organization(org.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(score.current_score, Decimal::from(50));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn concurrent_reports_on_same_target_leave_one_open(ctx: &TestHarness) {
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let (_, org) = create_approved_organization(&ctx.db_pool, &admin).await.unwrap();
    let reporter = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    let token = ctx.token_for(&reporter);
    let body = json!({
        "report_type": "SPAM",
        "entity_type": "ORGANIZATION",
        "entity_id": org.id,
        "reason": "Toplu mesaj"
    });

    let (a, b) = tokio::join!(
        ctx.post("/api/v1/reports", Some(&token), body.clone()),
        ctx.post("/api/v1/reports", Some(&token), body.clone()),
    );
    let mut statuses = vec![a.status, b.status];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);

    let open: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM reports WHERE reporter_id = $1 AND status IN ('PENDING', 'IN_REVIEW')",
    )
    .bind(reporter.id)
    .fetch_one(&ctx.db_pool)
    .await
    .unwrap();
    assert_eq!(open, 1);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn closed_report_allows_a_new_one(ctx: &TestHarness) {
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let (_, org) = create_approved_organization(&ctx.db_pool, &admin).await.unwrap();
    let reporter = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    let token = ctx.token_for(&reporter);
    let body = json!({
        "report_type": "OTHER",
        "entity_type": "ORGANIZATION",
        "entity_id": org.id,
        "reason": "İletişim bilgisi yok"
    });

    let first = ctx.post("/api/v1/reports", Some(&token), body.clone()).await;
    let report_id = first.data()["id"].as_str().unwrap().to_string();
    let dismissed = ctx
        .post(
            &format!("/api/v1/admin/reports/{}/resolve", report_id),
            Some(&ctx.token_for(&admin)),
            json!({ "resolution": "DISMISSED", "resolution_notes": "Bilgiler mevcut" }),
        )
        .await;
    assert_eq!(dismissed.status, StatusCode::OK, "{}", dismissed.body);

    let again = ctx.post("/api/v1/reports", Some(&token), body).await;
    assert_eq!(again.status, StatusCode::CREATED, "{}", again.body);
}
