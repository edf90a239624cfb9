//! Registration, login and token handling through the HTTP router.

mod common;

use crate::common::{create_user, TestHarness, TEST_PASSWORD};
use axum::http::StatusCode;
use serde_json::json;
use server_core::common::UserRole;
use test_context::test_context;
use uuid::Uuid;

fn unique_email() -> String {
    format!("bagisci-{}@test.seffafbagis.org", Uuid::new_v4().simple())
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn register_then_login_returns_tokens(ctx: &TestHarness) {
    let email = unique_email();
    let res = ctx
        .post(
            "/api/v1/auth/register",
            None,
            json!({
                "email": email,
                "password": TEST_PASSWORD,
                "password_confirm": TEST_PASSWORD,
                "first_name": "Ayşe",
                "last_name": "Yılmaz"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(res.data()["user"]["email"], json!(email));
    assert_eq!(res.data()["user"]["role"], json!("DONOR"));
    assert_eq!(res.data()["user"]["email_verified"], json!(false));

    let res = ctx
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "email": email.to_uppercase(), "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let access = res.data()["access_token"].as_str().unwrap().to_string();
    assert!(res.data()["refresh_token"].as_str().is_some());

    let me = ctx.get("/api/v1/users/me", Some(&access)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.data()["first_name"], json!("Ayşe"));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn duplicate_registration_is_a_conflict(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    let res = ctx
        .post(
            "/api/v1/auth/register",
            None,
            json!({
                "email": user.email,
                "password": TEST_PASSWORD,
                "password_confirm": TEST_PASSWORD,
                "first_name": "Ali",
                "last_name": "Demir"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn wrong_password_is_rejected(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    let res = ctx
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "email": user.email, "password": "Yanlis!Sifre99" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["success"], json!(false));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn refresh_token_rotates_once(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    let login = ctx
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "email": user.email, "password": TEST_PASSWORD }),
        )
        .await;
    let refresh = login.data()["refresh_token"].as_str().unwrap().to_string();

    let first = ctx
        .post("/api/v1/auth/refresh", None, json!({ "refresh_token": refresh }))
        .await;
    assert_eq!(first.status, StatusCode::OK, "{}", first.body);

    let replay = ctx
        .post("/api/v1/auth/refresh", None, json!({ "refresh_token": refresh }))
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn protected_routes_require_a_token(ctx: &TestHarness) {
    let res = ctx.get("/api/v1/users/me", None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = ctx.get("/api/v1/users/me", Some("not-a-jwt")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn fifth_failure_locks_the_account(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    for _ in 0..5 {
        let res = ctx
            .post(
                "/api/v1/auth/login",
                None,
                json!({ "email": user.email, "password": "Yanlis!Sifre99" }),
            )
            .await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    }

    // Locked accounts answer exactly like a bad password.
    let res = ctx
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "email": user.email, "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let locked_until: Option<chrono::DateTime<chrono::Utc>> =
        sqlx::query_scalar("SELECT locked_until FROM users WHERE id = $1")
            .bind(user.id)
            .fetch_one(&ctx.db_pool)
            .await
            .unwrap();
    assert!(locked_until.unwrap() > chrono::Utc::now());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn replayed_refresh_token_revokes_the_whole_family(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool, UserRole::Donor).await.unwrap();
    let login = ctx
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "email": user.email, "password": TEST_PASSWORD }),
        )
        .await;
    let original = login.data()["refresh_token"].as_str().unwrap().to_string();

    let rotated = ctx
        .post("/api/v1/auth/refresh", None, json!({ "refresh_token": original }))
        .await;
    assert_eq!(rotated.status, StatusCode::OK, "{}", rotated.body);
    let successor = rotated.data()["refresh_token"].as_str().unwrap().to_string();

    let replay = ctx
        .post("/api/v1/auth/refresh", None, json!({ "refresh_token": original }))
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);

    let res = ctx
        .post("/api/v1/auth/refresh", None, json!({ "refresh_token": successor }))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}
