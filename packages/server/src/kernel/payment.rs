//! Payment gateway used when no card processor is configured.
//!
//! Behaves like a sandbox: every card succeeds except numbers ending in
//! `0000` and cards past their expiry month.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use tracing::info;
use uuid::Uuid;

use super::{BasePaymentGateway, CardDetails, PaymentOutcome, PaymentRequest, PaymentSource};

const DECLINED_SUFFIX: &str = "0000";

#[derive(Debug, Default, Clone)]
pub struct SimulatedPaymentGateway;

impl SimulatedPaymentGateway {
    pub fn new() -> Self {
        Self
    }

    fn card_decline_reason(card: &CardDetails) -> Option<String> {
        let digits: String = card.number.chars().filter(|c| c.is_ascii_digit()).collect();
        if !(12..=19).contains(&digits.len()) {
            return Some("Invalid card number".to_string());
        }
        if card.cvc.len() < 3 || !card.cvc.chars().all(|c| c.is_ascii_digit()) {
            return Some("Invalid security code".to_string());
        }
        let now = Utc::now();
        let expired = card.expiry_year < now.year()
            || (card.expiry_year == now.year() && card.expiry_month < now.month());
        if card.expiry_month == 0 || card.expiry_month > 12 || expired {
            return Some("Card has expired".to_string());
        }
        if digits.ends_with(DECLINED_SUFFIX) {
            return Some("Card declined by issuer".to_string());
        }
        None
    }
}

#[async_trait]
impl BasePaymentGateway for SimulatedPaymentGateway {
    async fn charge(&self, request: PaymentRequest) -> Result<PaymentOutcome> {
        let decline = match &request.source {
            PaymentSource::Card(card) => Self::card_decline_reason(card),
            PaymentSource::Token(token) if token.contains(&format!("_{}_", DECLINED_SUFFIX)) => {
                Some("Stored card declined by issuer".to_string())
            }
            PaymentSource::Token(_) => None,
        };

        if let Some(reason) = decline {
            info!(reference = %request.reference, reason = %reason, "Simulated charge declined");
            return Ok(PaymentOutcome::Declined { reason });
        }

        let transaction_id = format!("SIM-{}", Uuid::new_v4().simple());
        info!(
            reference = %request.reference,
            amount = %request.amount,
            transaction_id = %transaction_id,
            "Simulated charge succeeded"
        );
        Ok(PaymentOutcome::Succeeded { transaction_id })
    }

    async fn tokenize(&self, card: &CardDetails) -> Result<String> {
        Ok(format!("tok_{}_{}", card.last_four(), Uuid::new_v4().simple()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn card(number: &str) -> CardDetails {
        CardDetails {
            holder_name: "Ayşe Yılmaz".to_string(),
            number: number.to_string(),
            expiry_month: 12,
            expiry_year: Utc::now().year() + 2,
            cvc: "123".to_string(),
        }
    }

    fn request(source: PaymentSource) -> PaymentRequest {
        PaymentRequest {
            amount: Decimal::from(100),
            currency: "TRY".to_string(),
            source,
            reference: "test".to_string(),
            description: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn charges_valid_card() {
        let gateway = SimulatedPaymentGateway::new();
        let outcome = gateway
            .charge(request(PaymentSource::Card(card("4111 1111 1111 1111"))))
            .await
            .unwrap();
        assert!(matches!(outcome, PaymentOutcome::Succeeded { transaction_id } if transaction_id.starts_with("SIM-")));
    }

    #[tokio::test]
    async fn declines_test_card_and_expired_card() {
        let gateway = SimulatedPaymentGateway::new();
        let outcome = gateway
            .charge(request(PaymentSource::Card(card("4111111111110000"))))
            .await
            .unwrap();
        assert!(matches!(outcome, PaymentOutcome::Declined { .. }));

        let mut expired = card("4111111111111111");
        expired.expiry_year = 2020;
        let outcome = gateway
            .charge(request(PaymentSource::Card(expired)))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            PaymentOutcome::Declined {
                reason: "Card has expired".to_string()
            }
        );
    }

    #[tokio::test]
    async fn tokens_keep_the_decline_marker() {
        let gateway = SimulatedPaymentGateway::new();
        let token = gateway.tokenize(&card("4111111111110000")).await.unwrap();
        assert!(token.starts_with("tok_0000_"));
        let outcome = gateway
            .charge(request(PaymentSource::Token(token)))
            .await
            .unwrap();
        assert!(matches!(outcome, PaymentOutcome::Declined { .. }));
    }

    #[test]
    fn debug_output_hides_card_number() {
        let debug = format!("{:?}", card("4111111111111111"));
        assert!(!debug.contains("4111111111111111"));
        assert!(debug.contains("**** 1111"));
    }
}
