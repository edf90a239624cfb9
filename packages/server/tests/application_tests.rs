//! Beneficiary aid applications from submission to completion, plus the
//! donation type catalogue.

mod common;

use crate::common::*;
use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::{json, Value as JsonValue};
use server_core::common::UserRole;
use server_core::domains::notifications::Notification;
use test_context::test_context;

fn application_body() -> JsonValue {
    json!({
        "title": "Kışlık yakacak yardımı",
        "description": "Beş kişilik ailemiz için kömür desteği rica ediyoruz.",
        "requested_amount": "4500",
        "location_city": "Van",
        "household_size": 5,
        "urgency_level": 4,
        "national_id": "10000000146",
        "documents": [{
            "document_type": "income_statement",
            "file_name": "gelir.pdf",
            "file_url": "https://cdn.example.org/gelir.pdf"
        }]
    })
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn application_is_routed_linked_and_completed(ctx: &TestHarness) {
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let (owner, org) = create_approved_organization(&ctx.db_pool, &admin).await.unwrap();
    let campaign = create_active_campaign(&ctx.db_pool, &org, &owner, &admin, Decimal::from(9000), 30)
        .await
        .unwrap();
    let applicant = create_user(&ctx.db_pool, UserRole::Beneficiary).await.unwrap();
    let applicant_token = ctx.token_for(&applicant);
    let admin_token = ctx.token_for(&admin);
    let owner_token = ctx.token_for(&owner);

    let res = ctx.post("/api/v1/applications", Some(&applicant_token), application_body()).await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(res.data()["status"], json!("PENDING"));
    assert_eq!(res.data()["national_id_masked"], json!("***-***-**46"));
    assert_eq!(res.data()["documents"][0]["document_type"], json!("INCOME_STATEMENT"));
    let id = res.data()["id"].as_str().unwrap().to_string();

    let res = ctx
        .post(
            &format!("/api/v1/admin/applications/{}/review", id),
            Some(&admin_token),
            json!({ "status": "APPROVED", "assigned_organization_id": org.id }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["status"], json!("APPROVED"));
    assert_eq!(res.data()["assigned_organization_id"], json!(org.id));

    let assigned = ctx.get("/api/v1/applications/assigned", Some(&owner_token)).await;
    assert_eq!(assigned.status, StatusCode::OK, "{}", assigned.body);
    assert_eq!(assigned.data()["total_items"], json!(1));

    let res = ctx
        .post(
            &format!("/api/v1/applications/{}/assign-campaign", id),
            Some(&owner_token),
            json!({ "campaign_id": campaign.id }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["assigned_campaign_id"], json!(campaign.id));

    let res = ctx
        .post(&format!("/api/v1/applications/{}/complete", id), Some(&owner_token), json!({}))
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["status"], json!("COMPLETED"));

    // Closed applications are no longer the applicant's to withdraw.
    let res = ctx
        .request(
            Method::DELETE,
            &format!("/api/v1/applications/my/{}", id),
            Some(&applicant_token),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let told = Notification::count_for_user(applicant.id, false, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(told, 2);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn only_beneficiaries_apply(ctx: &TestHarness) {
    let donor = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    let res = ctx
        .post("/api/v1/applications", Some(&ctx.token_for(&donor)), application_body())
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn rejection_carries_a_reason_and_closes_the_application(ctx: &TestHarness) {
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let applicant = create_user(&ctx.db_pool, UserRole::Beneficiary).await.unwrap();
    let applicant_token = ctx.token_for(&applicant);
    let admin_token = ctx.token_for(&admin);
    let res = ctx.post("/api/v1/applications", Some(&applicant_token), application_body()).await;
    let id = res.data()["id"].as_str().unwrap().to_string();
    let review = format!("/api/v1/admin/applications/{}/review", id);

    let res = ctx.post(&review, Some(&admin_token), json!({ "status": "REJECTED" })).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), Some("VALIDATION_ERROR"));

    let res = ctx
        .post(
            &review,
            Some(&admin_token),
            json!({ "status": "REJECTED", "rejection_reason": "Belgeler eksik" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["rejection_reason"], json!("Belgeler eksik"));

    let res = ctx.post(&review, Some(&admin_token), json!({ "status": "APPROVED" })).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = ctx
        .post(
            &format!("/api/v1/applications/my/{}/documents", id),
            Some(&applicant_token),
            json!({
                "document_type": "RENT_CONTRACT",
                "file_name": "kira.pdf",
                "file_url": "https://cdn.example.org/kira.pdf"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn applicants_edit_and_withdraw_pending_applications(ctx: &TestHarness) {
    let applicant = create_user(&ctx.db_pool, UserRole::Beneficiary).await.unwrap();
    let token = ctx.token_for(&applicant);
    let res = ctx.post("/api/v1/applications", Some(&token), application_body()).await;
    let id = res.data()["id"].as_str().unwrap().to_string();

    let stranger = create_user(&ctx.db_pool, UserRole::Beneficiary).await.unwrap();
    let res = ctx
        .get(&format!("/api/v1/applications/my/{}", id), Some(&ctx.token_for(&stranger)))
        .await;
    assert!(matches!(
        res.status,
        StatusCode::NOT_FOUND | StatusCode::FORBIDDEN
    ));

    let res = ctx
        .request(
            Method::PUT,
            &format!("/api/v1/applications/my/{}", id),
            Some(&token),
            Some(json!({ "urgency_level": 5, "location_district": "Erciş" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["urgency_level"], json!(5));
    assert_eq!(res.data()["location_district"], json!("Erciş"));

    let res = ctx
        .post(
            &format!("/api/v1/applications/my/{}/documents", id),
            Some(&token),
            json!({
                "document_type": "rent_contract",
                "file_name": "kira.pdf",
                "file_url": "https://cdn.example.org/kira.pdf"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let document_id = res.data()["id"].as_str().unwrap().to_string();
    let res = ctx
        .request(
            Method::DELETE,
            &format!("/api/v1/applications/my/{}/documents/{}", id, document_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let res = ctx.get(&format!("/api/v1/applications/my/{}", id), Some(&token)).await;
    assert_eq!(res.data()["documents"].as_array().unwrap().len(), 1);

    let res = ctx
        .request(
            Method::DELETE,
            &format!("/api/v1/applications/my/{}", id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);

    let mine = ctx.get("/api/v1/applications/my", Some(&token)).await;
    assert!(mine.data().as_array().unwrap().is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn admin_stats_count_by_status(ctx: &TestHarness) {
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let applicant = create_user(&ctx.db_pool, UserRole::Beneficiary).await.unwrap();
    ctx.post("/api/v1/applications", Some(&ctx.token_for(&applicant)), application_body())
        .await;

    let res = ctx
        .get("/api/v1/admin/applications/stats", Some(&ctx.token_for(&admin)))
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let data = res.data();
    assert!(data["pending"].as_i64().unwrap() >= 1);
    let parts = ["pending", "in_review", "approved", "rejected", "completed"]
        .iter()
        .map(|k| data[*k].as_i64().unwrap())
        .sum::<i64>();
    assert_eq!(parts, data["total"].as_i64().unwrap());

    let res = ctx
        .get("/api/v1/admin/applications/stats", Some(&ctx.token_for(&applicant)))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn donation_types_are_looked_up_by_code(ctx: &TestHarness) {
    let res = ctx.get("/api/v1/donation-types/active", None).await;
    assert_eq!(res.status, StatusCode::OK);
    let codes: Vec<_> = res
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["type_code"].as_str().unwrap().to_string())
        .collect();
    assert!(codes.contains(&"ZAKAT".to_string()));

    let res = ctx.get("/api/v1/donation-types/fitra", None).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["type_code"], json!("FITRA"));
    assert!(res.data()["minimum_amount"].is_string());

    let res = ctx.get("/api/v1/donation-types/NO-SUCH", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
