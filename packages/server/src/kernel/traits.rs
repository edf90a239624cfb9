// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Naming convention: Base* for trait names (e.g., BasePaymentGateway)

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Payment Gateway Trait
// =============================================================================

/// Card details as submitted by the donor. Never persisted.
#[derive(Clone, Deserialize)]
pub struct CardDetails {
    pub holder_name: String,
    pub number: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub cvc: String,
}

impl CardDetails {
    pub fn last_four(&self) -> String {
        let digits: String = self.number.chars().filter(|c| c.is_ascii_digit()).collect();
        digits
            .chars()
            .skip(digits.len().saturating_sub(4))
            .collect()
    }
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("holder_name", &self.holder_name)
            .field("number", &format!("**** {}", self.last_four()))
            .finish()
    }
}

/// How the charge is funded
#[derive(Debug, Clone)]
pub enum PaymentSource {
    Card(CardDetails),
    /// Stored token from a recurring donation
    Token(String),
}

#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub currency: String,
    pub source: PaymentSource,
    /// Our own reference (donation id or checkout id) for reconciliation
    pub reference: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PaymentOutcome {
    Succeeded { transaction_id: String },
    Declined { reason: String },
}

#[async_trait]
pub trait BasePaymentGateway: Send + Sync {
    /// Charge the source. `Err` means the gateway could not be reached;
    /// a refused card is `Ok(PaymentOutcome::Declined)`.
    async fn charge(&self, request: PaymentRequest) -> Result<PaymentOutcome>;

    /// Exchange card details for a reusable token.
    async fn tokenize(&self, card: &CardDetails) -> Result<String>;
}
