use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::validation::{http_url, max_length, require_text, tc_kimlik};
use crate::common::{ApiError, CampaignId, CategoryId, OrganizationId, UserId};
use crate::domains::applications::models::{
    Application, ApplicationChanges, ApplicationDocument, ApplicationStatus, CityCount,
    NewApplication, NewApplicationDocument,
};

pub const MAX_DOCUMENTS: i64 = 10;
const MAX_HOUSEHOLD_SIZE: i32 = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentInput {
    pub document_type: String,
    pub file_name: String,
    pub file_url: String,
}

impl DocumentInput {
    pub fn validate(&self) -> Result<NewApplicationDocument, ApiError> {
        require_text("document_type", &self.document_type)?;
        max_length("document_type", Some(&self.document_type), 50)?;
        require_text("file_name", &self.file_name)?;
        max_length("file_name", Some(&self.file_name), 255)?;
        Ok(NewApplicationDocument {
            document_type: self.document_type.trim().to_uppercase(),
            file_name: self.file_name.trim().to_string(),
            file_url: http_url("file_url", &self.file_url)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateApplicationInput {
    pub category_id: Option<CategoryId>,
    pub title: String,
    pub description: String,
    pub requested_amount: Option<Decimal>,
    pub location_city: Option<String>,
    pub location_district: Option<String>,
    pub household_size: Option<i32>,
    pub urgency_level: Option<i32>,
    /// Checked and stored masked, never in full
    pub national_id: Option<String>,
    #[serde(default)]
    pub documents: Vec<DocumentInput>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_numbers(
    requested_amount: Option<Decimal>,
    household_size: Option<i32>,
    urgency_level: Option<i32>,
) -> Result<(), ApiError> {
    if matches!(requested_amount, Some(a) if a <= Decimal::ZERO) {
        return Err(ApiError::validation(
            "requested_amount",
            "Requested amount must be greater than zero",
        ));
    }
    if matches!(household_size, Some(n) if !(1..=MAX_HOUSEHOLD_SIZE).contains(&n)) {
        return Err(ApiError::validation(
            "household_size",
            format!("Household size must be between 1 and {}", MAX_HOUSEHOLD_SIZE),
        ));
    }
    if matches!(urgency_level, Some(n) if !(1..=5).contains(&n)) {
        return Err(ApiError::validation(
            "urgency_level",
            "Urgency level must be between 1 and 5",
        ));
    }
    Ok(())
}

fn check_texts(title: Option<&str>, description: Option<&str>) -> Result<(), ApiError> {
    if let Some(title) = title {
        require_text("title", title)?;
        max_length("title", Some(title), 255)?;
    }
    if let Some(description) = description {
        require_text("description", description)?;
        max_length("description", Some(description), 5000)?;
    }
    Ok(())
}

impl CreateApplicationInput {
    pub fn into_parts(
        self,
        applicant_id: UserId,
    ) -> Result<(NewApplication, Vec<NewApplicationDocument>), ApiError> {
        check_texts(Some(&self.title), Some(&self.description))?;
        check_numbers(self.requested_amount, self.household_size, self.urgency_level)?;
        let location_city = clean(self.location_city);
        let location_district = clean(self.location_district);
        max_length("location_city", location_city.as_deref(), 100)?;
        max_length("location_district", location_district.as_deref(), 100)?;
        if self.documents.len() as i64 > MAX_DOCUMENTS {
            return Err(ApiError::validation(
                "documents",
                format!("At most {} documents are allowed", MAX_DOCUMENTS),
            ));
        }
        let documents = self
            .documents
            .iter()
            .map(DocumentInput::validate)
            .collect::<Result<Vec<_>, _>>()?;

        let national_id_masked = match clean(self.national_id) {
            Some(raw) => {
                tc_kimlik::validate(&raw).into_api_result("national_id")?;
                Some(tc_kimlik::mask(&raw))
            }
            None => None,
        };

        Ok((
            NewApplication {
                applicant_id,
                category_id: self.category_id,
                title: self.title.trim().to_string(),
                description: self.description.trim().to_string(),
                requested_amount: self.requested_amount,
                location_city,
                location_district,
                household_size: self.household_size,
                urgency_level: self.urgency_level.unwrap_or(1),
                national_id_masked,
            },
            documents,
        ))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateApplicationInput {
    pub category_id: Option<CategoryId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub requested_amount: Option<Decimal>,
    pub location_city: Option<String>,
    pub location_district: Option<String>,
    pub household_size: Option<i32>,
    pub urgency_level: Option<i32>,
}

impl UpdateApplicationInput {
    pub fn into_changes(self) -> Result<ApplicationChanges, ApiError> {
        check_texts(self.title.as_deref(), self.description.as_deref())?;
        check_numbers(self.requested_amount, self.household_size, self.urgency_level)?;
        let location_city = clean(self.location_city);
        let location_district = clean(self.location_district);
        max_length("location_city", location_city.as_deref(), 100)?;
        max_length("location_district", location_district.as_deref(), 100)?;
        Ok(ApplicationChanges {
            category_id: self.category_id,
            title: self.title.map(|t| t.trim().to_string()),
            description: self.description.map(|d| d.trim().to_string()),
            requested_amount: self.requested_amount,
            location_city,
            location_district,
            household_size: self.household_size,
            urgency_level: self.urgency_level,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewApplicationInput {
    pub status: ApplicationStatus,
    pub rejection_reason: Option<String>,
    pub assigned_organization_id: Option<OrganizationId>,
}

impl ReviewApplicationInput {
    /// Trimmed rejection reason, required when rejecting.
    pub fn validate(&self) -> Result<Option<String>, ApiError> {
        let reason = clean(self.rejection_reason.clone());
        if self.status == ApplicationStatus::Rejected && reason.is_none() {
            return Err(ApiError::validation(
                "rejection_reason",
                "A reason is required when rejecting an application",
            ));
        }
        max_length("rejection_reason", reason.as_deref(), 1000)?;
        Ok(reason)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignOrganizationInput {
    pub organization_id: OrganizationId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignCampaignInput {
    pub campaign_id: CampaignId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminApplicationQuery {
    pub status: Option<ApplicationStatus>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: Application,
    pub category_name: Option<String>,
    pub documents: Vec<ApplicationDocument>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplicationStats {
    pub total: i64,
    pub pending: i64,
    pub in_review: i64,
    pub approved: i64,
    pub rejected: i64,
    pub completed: i64,
    pub by_city: Vec<CityCount>,
}

impl ApplicationStats {
    pub fn from_counts(counts: &[(ApplicationStatus, i64)], by_city: Vec<CityCount>) -> Self {
        let mut stats = ApplicationStats {
            by_city,
            ..Default::default()
        };
        for (status, count) in counts {
            stats.total += count;
            match status {
                ApplicationStatus::Pending => stats.pending = *count,
                ApplicationStatus::InReview => stats.in_review = *count,
                ApplicationStatus::Approved => stats.approved = *count,
                ApplicationStatus::Rejected => stats.rejected = *count,
                ApplicationStatus::Completed => stats.completed = *count,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CreateApplicationInput {
        CreateApplicationInput {
            category_id: None,
            title: "  Kışlık yakacak  ".to_string(),
            description: "Beş kişilik aile için kömür".to_string(),
            requested_amount: Some(Decimal::new(4500, 0)),
            location_city: Some(" Van ".to_string()),
            location_district: Some(" ".to_string()),
            household_size: Some(5),
            urgency_level: None,
            national_id: Some("10000000146".to_string()),
            documents: vec![DocumentInput {
                document_type: "income_statement".to_string(),
                file_name: "gelir.pdf".to_string(),
                file_url: "https://cdn.example.org/gelir.pdf".to_string(),
            }],
        }
    }

    #[test]
    fn national_id_is_stored_masked() {
        let (new, documents) = input().into_parts(UserId::new()).unwrap();
        assert_eq!(new.national_id_masked.as_deref(), Some("***-***-**46"));
        assert_eq!(new.title, "Kışlık yakacak");
        assert_eq!(new.location_city.as_deref(), Some("Van"));
        assert!(new.location_district.is_none());
        assert_eq!(new.urgency_level, 1);
        assert_eq!(documents[0].document_type, "INCOME_STATEMENT");
    }

    #[test]
    fn invalid_national_id_is_a_field_error() {
        let mut bad = input();
        bad.national_id = Some("10000000147".to_string());
        match bad.into_parts(UserId::new()) {
            Err(ApiError::Validation { field, .. }) => assert_eq!(field, "national_id"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn urgency_and_household_are_bounded() {
        let mut urgent = input();
        urgent.urgency_level = Some(6);
        assert!(urgent.into_parts(UserId::new()).is_err());

        let mut empty_home = input();
        empty_home.household_size = Some(0);
        assert!(empty_home.into_parts(UserId::new()).is_err());

        let changes = UpdateApplicationInput {
            requested_amount: Some(Decimal::ZERO),
            ..Default::default()
        };
        assert!(changes.into_changes().is_err());
    }

    #[test]
    fn rejection_needs_a_reason() {
        let review = ReviewApplicationInput {
            status: ApplicationStatus::Rejected,
            rejection_reason: Some("  ".to_string()),
            assigned_organization_id: None,
        };
        assert!(review.validate().is_err());

        let approve = ReviewApplicationInput {
            status: ApplicationStatus::Approved,
            rejection_reason: None,
            assigned_organization_id: None,
        };
        assert_eq!(approve.validate().unwrap(), None);
    }

    #[test]
    fn stats_add_up() {
        let stats = ApplicationStats::from_counts(
            &[(ApplicationStatus::Pending, 3), (ApplicationStatus::Completed, 2)],
            vec![],
        );
        assert_eq!(stats.total, 5);
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.rejected, 0);
    }
}
