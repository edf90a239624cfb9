use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::validation::{max_length, require_text};
use crate::common::{ApiError, CampaignId};
use crate::domains::evidence::models::{
    Evidence, EvidenceDocument, EvidenceStatus, EvidenceType, NewEvidenceDocument,
};

/// Reminders go out when this many days are left before the deadline.
pub const REMINDER_DAYS: [i64; 3] = [7, 3, 1];

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentInput {
    pub file_name: String,
    pub file_url: String,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
}

impl DocumentInput {
    pub fn validate(&self) -> Result<NewEvidenceDocument, ApiError> {
        require_text("file_name", &self.file_name)?;
        max_length("file_name", Some(&self.file_name), 255)?;
        let url = self.file_url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ApiError::validation("file_url", "file_url must be an http(s) URL"));
        }
        if self.file_size.is_some_and(|s| s < 0) {
            return Err(ApiError::validation("file_size", "file_size cannot be negative"));
        }
        Ok(NewEvidenceDocument {
            file_name: self.file_name.trim().to_string(),
            file_url: url.to_string(),
            file_size: self.file_size,
            mime_type: self.mime_type.clone(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvidenceInput {
    pub campaign_id: CampaignId,
    pub evidence_type: EvidenceType,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub amount_spent: Decimal,
    pub spend_date: Option<NaiveDate>,
    pub vendor_name: Option<String>,
    pub vendor_tax_number: Option<String>,
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub documents: Vec<DocumentInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEvidenceInput {
    pub evidence_type: Option<EvidenceType>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount_spent: Option<Decimal>,
    pub spend_date: Option<NaiveDate>,
    pub vendor_name: Option<String>,
    pub vendor_tax_number: Option<String>,
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub documents: Vec<DocumentInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MyEvidenceQuery {
    pub campaign_id: Option<CampaignId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvidenceStatusQuery {
    pub status: Option<EvidenceStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewEvidenceInput {
    pub approved: bool,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvidenceDetail {
    #[serde(flatten)]
    pub evidence: Evidence,
    pub documents: Vec<EvidenceDocument>,
}

pub fn check_amount_spent(amount: Decimal) -> Result<(), ApiError> {
    if amount < Decimal::ZERO {
        return Err(ApiError::validation("amount_spent", "amount_spent cannot be negative"));
    }
    Ok(())
}

/// Claimed spending may never exceed what the campaign collected.
pub fn check_within_collected(
    already_claimed: Decimal,
    amount: Decimal,
    collected: Decimal,
) -> Result<(), ApiError> {
    if already_claimed + amount > collected {
        return Err(ApiError::validation(
            "amount_spent",
            format!(
                "Total evidence amount ({}) would exceed the collected amount ({})",
                already_claimed + amount,
                collected
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(url: &str) -> DocumentInput {
        DocumentInput {
            file_name: "fatura.pdf".to_string(),
            file_url: url.to_string(),
            file_size: Some(2048),
            mime_type: Some("application/pdf".to_string()),
        }
    }

    #[test]
    fn spending_cannot_exceed_collected() {
        let collected = Decimal::from(1000);
        assert!(check_within_collected(Decimal::from(600), Decimal::from(400), collected).is_ok());
        assert!(check_within_collected(Decimal::from(600), Decimal::from(401), collected).is_err());
        assert!(check_amount_spent(Decimal::ZERO).is_ok());
        assert!(check_amount_spent(Decimal::from(-1)).is_err());
    }

    #[test]
    fn documents_need_http_urls() {
        assert!(doc("https://cdn.example.org/fatura.pdf").validate().is_ok());
        assert!(doc("ftp://example.org/fatura.pdf").validate().is_err());
        let mut blank = doc("https://cdn.example.org/x.pdf");
        blank.file_name = " ".to_string();
        assert!(blank.validate().is_err());
    }
}
