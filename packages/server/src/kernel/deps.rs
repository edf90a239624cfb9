//! Server dependencies for activities (using traits for testability)
//!
//! This module provides the central dependency container used by all domain
//! activities, routes and scheduled jobs.

use chrono::Duration;
use sqlx::PgPool;
use std::sync::Arc;

use crate::common::auth::HasAuthContext;
use crate::domains::auth::JwtService;
use crate::kernel::BasePaymentGateway;

/// Lifetimes of issued credentials
#[derive(Debug, Clone, Copy)]
pub struct TokenPolicy {
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            access_token_ttl: Duration::minutes(15),
            refresh_token_ttl: Duration::days(7),
        }
    }
}

/// Server dependencies accessible to activities
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub jwt_service: Arc<JwtService>,
    pub payment_gateway: Arc<dyn BasePaymentGateway>,
    pub token_policy: TokenPolicy,
    pub admin_emails: Vec<String>,
}

impl ServerDeps {
    pub fn new(
        db_pool: PgPool,
        jwt_service: Arc<JwtService>,
        payment_gateway: Arc<dyn BasePaymentGateway>,
        token_policy: TokenPolicy,
        admin_emails: Vec<String>,
    ) -> Self {
        Self {
            db_pool,
            jwt_service,
            payment_gateway,
            token_policy,
            admin_emails,
        }
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.iter().any(|e| e.eq_ignore_ascii_case(email))
    }
}

/// Implement HasAuthContext for ServerDeps to enable authorization checks
impl HasAuthContext for ServerDeps {
    fn admin_emails(&self) -> &[String] {
        &self.admin_emails
    }
}
