//! Organization onboarding and the bank accounts behind it.

mod common;

use crate::common::*;
use axum::http::{Method, StatusCode};
use serde_json::{json, Value as JsonValue};
use server_core::common::UserRole;
use test_context::test_context;
use uuid::Uuid;

fn tax_number() -> String {
    format!("{:010}", Uuid::new_v4().as_u128() % 10_000_000_000)
}

/// Foundation account with a freshly registered PENDING organization.
async fn registered(ctx: &TestHarness) -> String {
    let user = create_user(&ctx.db_pool, UserRole::Foundation).await.unwrap();
    let token = ctx.token_for(&user);
    let res = ctx
        .post(
            "/api/v1/organizations",
            Some(&token),
            json!({
                "organization_type": "ASSOCIATION",
                "legal_name": "Umut Dayanışma Derneği",
                "tax_number": tax_number(),
                "description": "Depremzede ailelere barınma desteği"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(res.data()["verification_status"], json!("PENDING"));
    token
}

async fn add_account(ctx: &TestHarness, token: &str, iban: &str) -> JsonValue {
    let res = ctx
        .post(
            "/api/v1/organizations/me/bank-accounts",
            Some(token),
            json!({ "bank_name": "Vakıfbank", "account_holder": "Umut Dayanışma Derneği", "iban": iban }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    res.data().clone()
}

async fn accounts(ctx: &TestHarness, token: &str) -> Vec<JsonValue> {
    let res = ctx.get("/api/v1/organizations/me/bank-accounts", Some(token)).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    res.data().as_array().unwrap().clone()
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn submission_needs_a_document_and_a_bank_account(ctx: &TestHarness) {
    let token = registered(ctx).await;

    let res = ctx.post("/api/v1/organizations/me/submit", Some(&token), json!({})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = ctx
        .post(
            "/api/v1/organizations/me/documents",
            Some(&token),
            json!({
                "document_type": "TAX_CERTIFICATE",
                "document_name": "Vergi levhası",
                "file_url": "https://cdn.example.org/vergi-levhasi.pdf"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);

    let res = ctx.post("/api/v1/organizations/me/submit", Some(&token), json!({})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    add_account(ctx, &token, "TR330006100519786457841326").await;

    let res = ctx.post("/api/v1/organizations/me/submit", Some(&token), json!({})).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["verification_status"], json!("IN_REVIEW"));

    // Already under review.
    let res = ctx.post("/api/v1/organizations/me/submit", Some(&token), json!({})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn only_foundations_register_organizations(ctx: &TestHarness) {
    let donor = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    let res = ctx
        .post(
            "/api/v1/organizations",
            Some(&ctx.token_for(&donor)),
            json!({
                "organization_type": "FOUNDATION",
                "legal_name": "Sahte Vakıf",
                "tax_number": tax_number()
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn first_account_is_primary_and_deleting_it_promotes_the_next(ctx: &TestHarness) {
    let token = registered(ctx).await;

    let first = add_account(ctx, &token, "TR330006100519786457841326").await;
    assert_eq!(first["is_primary"], json!(true));
    // Stored normalized, so the compact form below is a duplicate.
    let second = add_account(ctx, &token, "TR32 0010 0099 9990 1234 5678 90").await;
    assert_eq!(second["is_primary"], json!(false));
    assert_eq!(second["iban"], json!("TR320010009999901234567890"));

    let dup = ctx
        .post(
            "/api/v1/organizations/me/bank-accounts",
            Some(&token),
            json!({ "bank_name": "Vakıfbank", "account_holder": "Umut", "iban": "TR320010009999901234567890" }),
        )
        .await;
    assert_eq!(dup.status, StatusCode::CONFLICT);

    let res = ctx
        .request(
            Method::PUT,
            &format!("/api/v1/organizations/me/bank-accounts/{}/primary", second["id"].as_str().unwrap()),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let listed = accounts(ctx, &token).await;
    assert_eq!(listed.iter().filter(|a| a["is_primary"] == json!(true)).count(), 1);

    let res = ctx
        .request(
            Method::DELETE,
            &format!("/api/v1/organizations/me/bank-accounts/{}", second["id"].as_str().unwrap()),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);

    let listed = accounts(ctx, &token).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], first["id"]);
    assert_eq!(listed[0]["is_primary"], json!(true));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn invalid_iban_is_a_field_error(ctx: &TestHarness) {
    let token = registered(ctx).await;
    let res = ctx
        .post(
            "/api/v1/organizations/me/bank-accounts",
            Some(&token),
            json!({ "bank_name": "Vakıfbank", "account_holder": "Umut", "iban": "TR330006100519786457841327" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), Some("VALIDATION_ERROR"));
    assert!(accounts(ctx, &token).await.is_empty());
}
