use serde::Deserialize;
use uuid::Uuid;

use crate::common::validation::{max_length, require_text};
use crate::common::{ApiError, UserId};
use crate::domains::reports::models::{
    NewReport, ReportEntityType, ReportPriority, ReportStatus, ReportType,
};

pub const MAX_EVIDENCE_URLS: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReportInput {
    pub report_type: ReportType,
    pub entity_type: ReportEntityType,
    pub entity_id: Uuid,
    pub reason: String,
    pub description: Option<String>,
    #[serde(default)]
    pub evidence_urls: Vec<String>,
}

impl CreateReportInput {
    pub fn into_new_report(self, reporter_id: UserId) -> Result<NewReport, ApiError> {
        require_text("reason", &self.reason)?;
        max_length("reason", Some(&self.reason), 255)?;
        max_length("description", self.description.as_deref(), 5000)?;
        if self.evidence_urls.len() > MAX_EVIDENCE_URLS {
            return Err(ApiError::validation(
                "evidence_urls",
                format!("At most {} evidence URLs are allowed", MAX_EVIDENCE_URLS),
            ));
        }
        let evidence_urls = self
            .evidence_urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(|u| {
                if u.starts_with("https://") || u.starts_with("http://") {
                    Ok(u.to_string())
                } else {
                    Err(ApiError::validation(
                        "evidence_urls",
                        "Evidence URLs must be http(s) URLs",
                    ))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NewReport {
            reporter_id,
            priority: self.report_type.default_priority(),
            report_type: self.report_type,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            reason: self.reason.trim().to_string(),
            description: self.description.filter(|d| !d.trim().is_empty()),
            evidence_urls,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminReportQuery {
    pub status: Option<ReportStatus>,
    pub priority: Option<ReportPriority>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignReportInput {
    pub assignee_id: UserId,
    pub priority: Option<ReportPriority>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveReportInput {
    pub resolution: ReportStatus,
    pub resolution_notes: String,
}

impl ResolveReportInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.resolution.is_open() {
            return Err(ApiError::validation(
                "resolution",
                "Resolution must be RESOLVED or DISMISSED",
            ));
        }
        require_text("resolution_notes", &self.resolution_notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(report_type: ReportType) -> CreateReportInput {
        CreateReportInput {
            report_type,
            entity_type: ReportEntityType::Campaign,
            entity_id: Uuid::new_v4(),
            reason: "  Sahte fatura  ".to_string(),
            description: Some("   ".to_string()),
            evidence_urls: vec!["https://example.org/a.png".to_string(), "".to_string()],
        }
    }

    #[test]
    fn fraud_reports_get_high_priority() {
        let report = input(ReportType::Fraud).into_new_report(UserId::new()).unwrap();
        assert_eq!(report.priority, ReportPriority::High);
        assert_eq!(report.reason, "Sahte fatura");
        assert!(report.description.is_none());
        assert_eq!(report.evidence_urls, vec!["https://example.org/a.png"]);

        let spam = input(ReportType::Spam).into_new_report(UserId::new()).unwrap();
        assert_eq!(spam.priority, ReportPriority::Medium);
    }

    #[test]
    fn non_http_evidence_urls_are_rejected() {
        let mut bad = input(ReportType::Other);
        bad.evidence_urls = vec!["ftp://example.org/x".to_string()];
        assert!(bad.into_new_report(UserId::new()).is_err());
    }

    #[test]
    fn resolution_must_close_the_report() {
        let open = ResolveReportInput {
            resolution: ReportStatus::InReview,
            resolution_notes: "x".to_string(),
        };
        assert!(open.validate().is_err());

        let blank = ResolveReportInput {
            resolution: ReportStatus::Dismissed,
            resolution_notes: " ".to_string(),
        };
        assert!(blank.validate().is_err());

        let fine = ResolveReportInput {
            resolution: ReportStatus::Resolved,
            resolution_notes: "Doğrulandı".to_string(),
        };
        assert!(fine.validate().is_ok());
    }
}
