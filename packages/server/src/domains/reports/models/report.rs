use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::common::{ReportId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportType {
    Fraud,
    InappropriateContent,
    MisleadingInfo,
    Spam,
    Other,
}

impl ReportType {
    pub fn default_priority(&self) -> ReportPriority {
        match self {
            ReportType::Fraud => ReportPriority::High,
            _ => ReportPriority::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_entity_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportEntityType {
    Campaign,
    Organization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Pending,
    InReview,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, ReportStatus::Pending | ReportStatus::InReview)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Report {
    pub id: ReportId,
    pub reporter_id: UserId,
    pub report_type: ReportType,
    pub entity_type: ReportEntityType,
    pub entity_id: Uuid,
    pub reason: String,
    pub description: Option<String>,
    pub evidence_urls: Vec<String>,
    pub priority: ReportPriority,
    pub status: ReportStatus,
    pub resolution_notes: Option<String>,
    pub resolved_by: Option<UserId>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub assigned_to: Option<UserId>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub reporter_id: UserId,
    pub report_type: ReportType,
    pub entity_type: ReportEntityType,
    pub entity_id: Uuid,
    pub reason: String,
    pub description: Option<String>,
    pub evidence_urls: Vec<String>,
    pub priority: ReportPriority,
}

impl Report {
    pub async fn find_by_id_optional(id: ReportId, pool: &PgPool) -> Result<Option<Self>> {
        let report = sqlx::query_as::<_, Self>("SELECT * FROM reports WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(report)
    }

    pub async fn find_for_reporter(
        reporter_id: UserId,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let reports = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM reports
            WHERE reporter_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(reporter_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(reports)
    }

    pub async fn count_for_reporter(reporter_id: UserId, pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE reporter_id = $1")
            .bind(reporter_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Without a status filter only open reports are listed, highest
    /// priority and oldest first.
    pub async fn find_filtered(
        status: Option<ReportStatus>,
        priority: Option<ReportPriority>,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let reports = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM reports
            WHERE (($1::report_status IS NULL AND status IN ('PENDING', 'IN_REVIEW')) OR status = $1)
              AND ($2::report_priority IS NULL OR priority = $2)
            ORDER BY priority DESC, created_at ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(status)
        .bind(priority)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(reports)
    }

    pub async fn count_filtered(
        status: Option<ReportStatus>,
        priority: Option<ReportPriority>,
        pool: &PgPool,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM reports
            WHERE (($1::report_status IS NULL AND status IN ('PENDING', 'IN_REVIEW')) OR status = $1)
              AND ($2::report_priority IS NULL OR priority = $2)
            "#,
        )
        .bind(status)
        .bind(priority)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// `None` when the reporter already has an open report on the target.
    pub async fn create(new: NewReport, pool: &PgPool) -> Result<Option<Self>> {
        let report = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO reports (
                reporter_id, report_type, entity_type, entity_id,
                reason, description, evidence_urls, priority
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (reporter_id, entity_type, entity_id)
                WHERE status IN ('PENDING', 'IN_REVIEW')
                DO NOTHING
            RETURNING *
            "#,
        )
        .bind(new.reporter_id)
        .bind(new.report_type)
        .bind(new.entity_type)
        .bind(new.entity_id)
        .bind(&new.reason)
        .bind(&new.description)
        .bind(&new.evidence_urls)
        .bind(new.priority)
        .fetch_optional(pool)
        .await?;
        Ok(report)
    }

    /// Open report -> IN_REVIEW with an assignee.
    pub async fn assign(
        id: ReportId,
        assignee: UserId,
        priority: Option<ReportPriority>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let report = sqlx::query_as::<_, Self>(
            r#"
            UPDATE reports SET
                status = 'IN_REVIEW',
                assigned_to = $2,
                assigned_at = NOW(),
                priority = COALESCE($3, priority),
                updated_at = NOW()
            WHERE id = $1 AND status IN ('PENDING', 'IN_REVIEW')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(assignee)
        .bind(priority)
        .fetch_optional(pool)
        .await?;
        Ok(report)
    }

    /// Open report -> RESOLVED or DISMISSED.
    pub async fn close(
        id: ReportId,
        status: ReportStatus,
        notes: &str,
        resolved_by: UserId,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let report = sqlx::query_as::<_, Self>(
            r#"
            UPDATE reports SET
                status = $2,
                resolution_notes = $3,
                resolved_by = $4,
                resolved_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status IN ('PENDING', 'IN_REVIEW')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(notes)
        .bind(resolved_by)
        .fetch_optional(conn)
        .await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraud_reports_start_high() {
        assert_eq!(ReportType::Fraud.default_priority(), ReportPriority::High);
        assert_eq!(ReportType::Spam.default_priority(), ReportPriority::Medium);
    }

    #[test]
    fn open_statuses() {
        assert!(ReportStatus::Pending.is_open());
        assert!(ReportStatus::InReview.is_open());
        assert!(!ReportStatus::Resolved.is_open());
        assert!(!ReportStatus::Dismissed.is_open());
    }
}
