// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::{Arc, Mutex};

use super::{
    BasePaymentGateway, CardDetails, PaymentOutcome, PaymentRequest, ServerDeps, TokenPolicy,
};
use crate::domains::auth::JwtService;

// =============================================================================
// Mock Payment Gateway
// =============================================================================

/// Records every charge and replays queued outcomes (success by default).
pub struct MockPaymentGateway {
    outcomes: Arc<Mutex<Vec<PaymentOutcome>>>,
    charges: Arc<Mutex<Vec<PaymentRequest>>>,
    fail_with_error: Arc<Mutex<bool>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(Vec::new())),
            charges: Arc::new(Mutex::new(Vec::new())),
            fail_with_error: Arc::new(Mutex::new(false)),
        }
    }

    /// Queue a decline for the next charge
    pub fn with_decline(self, reason: &str) -> Self {
        self.outcomes.lock().unwrap().push(PaymentOutcome::Declined {
            reason: reason.to_string(),
        });
        self
    }

    /// Make every charge fail as if the gateway were unreachable
    pub fn unreachable(self) -> Self {
        *self.fail_with_error.lock().unwrap() = true;
        self
    }

    pub fn charges(&self) -> Vec<PaymentRequest> {
        self.charges.lock().unwrap().clone()
    }

    pub fn charge_count(&self) -> usize {
        self.charges.lock().unwrap().len()
    }

    pub fn total_charged(&self) -> Decimal {
        self.charges.lock().unwrap().iter().map(|c| c.amount).sum()
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePaymentGateway for MockPaymentGateway {
    async fn charge(&self, request: PaymentRequest) -> Result<PaymentOutcome> {
        if *self.fail_with_error.lock().unwrap() {
            anyhow::bail!("payment gateway unreachable");
        }
        let call_number = {
            let mut charges = self.charges.lock().unwrap();
            charges.push(request);
            charges.len()
        };
        let mut outcomes = self.outcomes.lock().unwrap();
        if !outcomes.is_empty() {
            return Ok(outcomes.remove(0));
        }
        Ok(PaymentOutcome::Succeeded {
            transaction_id: format!("MOCK-{}", call_number),
        })
    }

    async fn tokenize(&self, card: &CardDetails) -> Result<String> {
        Ok(format!("tok_{}_mock", card.last_four()))
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-integration-tests";
pub const TEST_JWT_ISSUER: &str = "seffaf-bagis-test";

/// Builds `ServerDeps` around mocks for tests.
pub struct TestDependencies {
    pub payment_gateway: Arc<MockPaymentGateway>,
    pub admin_emails: Vec<String>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            payment_gateway: Arc::new(MockPaymentGateway::new()),
            admin_emails: vec!["admin@seffafbagis.test".to_string()],
        }
    }

    pub fn with_payment_gateway(mut self, gateway: MockPaymentGateway) -> Self {
        self.payment_gateway = Arc::new(gateway);
        self
    }

    pub fn into_server_deps(self, db_pool: PgPool) -> ServerDeps {
        ServerDeps::new(
            db_pool,
            Arc::new(JwtService::new(TEST_JWT_SECRET, TEST_JWT_ISSUER.to_string())),
            self.payment_gateway,
            TokenPolicy::default(),
            self.admin_emails,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
