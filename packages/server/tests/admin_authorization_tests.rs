//! Admin-only endpoints reject anonymous and non-admin callers.

mod common;

use crate::common::{create_user, TestHarness};
use axum::http::StatusCode;
use server_core::common::UserRole;
use test_context::test_context;

const ADMIN_ENDPOINTS: &[&str] = &[
    "/api/v1/admin/dashboard",
    "/api/v1/admin/users",
    "/api/v1/admin/reports",
    "/api/v1/admin/donations",
    "/api/v1/admin/audit-logs",
];

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn admin_endpoints_require_authentication(ctx: &TestHarness) {
    for path in ADMIN_ENDPOINTS {
        let res = ctx.get(path, None).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{}", path);
    }
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn admin_endpoints_reject_non_admins(ctx: &TestHarness) {
    for role in [UserRole::Donor, UserRole::Foundation, UserRole::Beneficiary] {
        let user = create_user(&ctx.db_pool, role).await.unwrap();
        let token = ctx.token_for(&user);
        for path in ADMIN_ENDPOINTS {
            let res = ctx.get(path, Some(&token)).await;
            assert_eq!(res.status, StatusCode::FORBIDDEN, "{} as {}", path, role);
        }
    }
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn admin_sees_dashboard(ctx: &TestHarness) {
    let admin = create_user(&ctx.db_pool, UserRole::Admin).await.unwrap();
    let res = ctx
        .get("/api/v1/admin/dashboard", Some(&ctx.token_for(&admin)))
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert!(res.data()["users_by_role"].is_array());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore] // Requires Docker
async fn health_reports_database(ctx: &TestHarness) {
    let res = ctx.get("/health", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["database"]["status"], serde_json::json!("ok"));
}
