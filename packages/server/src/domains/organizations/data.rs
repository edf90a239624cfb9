use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domains::organizations::models::{
    BankAccount, Organization, OrganizationContact, OrganizationDocument, OrganizationType,
    VerificationStatus,
};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrganizationInput {
    pub organization_type: OrganizationType,
    pub legal_name: String,
    pub trade_name: Option<String>,
    pub tax_number: String,
    pub derbis_number: Option<String>,
    pub mersis_number: Option<String>,
    pub establishment_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub mission_statement: Option<String>,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrganizationInput {
    pub organization_type: Option<OrganizationType>,
    pub legal_name: Option<String>,
    pub trade_name: Option<String>,
    pub tax_number: Option<String>,
    pub derbis_number: Option<String>,
    pub mersis_number: Option<String>,
    pub establishment_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub mission_statement: Option<String>,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
}

impl UpdateOrganizationInput {
    /// True when the input touches a field that is frozen after approval.
    pub fn touches_legal_identity(&self, current: &Organization) -> bool {
        self.organization_type
            .map_or(false, |t| t != current.organization_type)
            || self.legal_name.as_deref().map_or(false, |v| v != current.legal_name)
            || self.tax_number.as_deref().map_or(false, |v| v != current.tax_number)
            || self
                .derbis_number
                .as_deref()
                .map_or(false, |v| Some(v) != current.derbis_number.as_deref())
            || self
                .mersis_number
                .as_deref()
                .map_or(false, |v| Some(v) != current.mersis_number.as_deref())
            || self
                .establishment_date
                .map_or(false, |d| Some(d) != current.establishment_date)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizationListQuery {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub organization_type: Option<OrganizationType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminOrganizationQuery {
    pub status: Option<VerificationStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectOrganizationInput {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeaturedInput {
    pub is_featured: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBankAccountInput {
    pub bank_name: String,
    pub branch_name: Option<String>,
    pub account_holder: String,
    pub iban: String,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateContactInput {
    pub contact_type: String,
    pub contact_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocumentInput {
    pub document_type: String,
    pub document_name: String,
    pub file_url: String,
}

/// Public organization page
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationDetail {
    #[serde(flatten)]
    pub organization: Organization,
    pub transparency_score: Option<Decimal>,
    pub transparency_level: Option<&'static str>,
    pub active_campaign_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

/// Owner and admin view with verification material
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationWorkspace {
    #[serde(flatten)]
    pub detail: OrganizationDetail,
    pub contacts: Vec<OrganizationContact>,
    pub bank_accounts: Vec<BankAccount>,
    pub documents: Vec<OrganizationDocument>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::UserId;
    use chrono::Utc;

    fn approved_org() -> Organization {
        Organization {
            id: Default::default(),
            user_id: UserId::new(),
            organization_type: OrganizationType::Foundation,
            legal_name: "Umut Vakfı".to_string(),
            trade_name: None,
            tax_number: "1234567890".to_string(),
            derbis_number: None,
            mersis_number: None,
            establishment_date: None,
            description: None,
            mission_statement: None,
            logo_url: None,
            website_url: None,
            verification_status: VerificationStatus::Approved,
            verified_at: Some(Utc::now()),
            verified_by: None,
            rejection_reason: None,
            resubmission_count: 0,
            last_resubmission_at: None,
            is_featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn cosmetic_fields_do_not_touch_legal_identity() {
        let org = approved_org();
        let input = UpdateOrganizationInput {
            description: Some("Yeni açıklama".into()),
            logo_url: Some("https://cdn.example.org/logo.png".into()),
            ..Default::default()
        };
        assert!(!input.touches_legal_identity(&org));
    }

    #[test]
    fn resending_the_same_legal_name_is_not_a_change() {
        let org = approved_org();
        let same = UpdateOrganizationInput {
            legal_name: Some("Umut Vakfı".into()),
            ..Default::default()
        };
        assert!(!same.touches_legal_identity(&org));

        let renamed = UpdateOrganizationInput {
            legal_name: Some("Umut Derneği".into()),
            ..Default::default()
        };
        assert!(renamed.touches_legal_identity(&org));
    }

    #[test]
    fn list_query_reads_type_parameter() {
        let query: OrganizationListQuery =
            serde_json::from_str(r#"{"q":"umut","type":"NGO"}"#).unwrap();
        assert_eq!(query.organization_type, Some(OrganizationType::Ngo));
    }
}
