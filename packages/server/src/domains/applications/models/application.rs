use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{ApplicationId, CampaignId, CategoryId, OrganizationId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    InReview,
    Approved,
    Rejected,
    Completed,
}

impl ApplicationStatus {
    /// Moves an admin may make. COMPLETED belongs to the assigned
    /// organization.
    pub fn can_review_to(&self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Pending, InReview) | (Pending, Approved) | (Pending, Rejected)
                | (InReview, Approved)
                | (InReview, Rejected)
        )
    }

    /// Still open for an organization assignment.
    pub fn is_routable(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Pending | ApplicationStatus::InReview | ApplicationStatus::Approved
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Application {
    pub id: ApplicationId,
    pub applicant_id: UserId,
    pub category_id: Option<CategoryId>,
    pub title: String,
    pub description: String,
    pub requested_amount: Option<Decimal>,
    pub status: ApplicationStatus,
    pub location_city: Option<String>,
    pub location_district: Option<String>,
    pub household_size: Option<i32>,
    pub urgency_level: i32,
    pub national_id_masked: Option<String>,
    pub rejection_reason: Option<String>,
    pub assigned_organization_id: Option<OrganizationId>,
    pub assigned_campaign_id: Option<CampaignId>,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub applicant_id: UserId,
    pub category_id: Option<CategoryId>,
    pub title: String,
    pub description: String,
    pub requested_amount: Option<Decimal>,
    pub location_city: Option<String>,
    pub location_district: Option<String>,
    pub household_size: Option<i32>,
    pub urgency_level: i32,
    pub national_id_masked: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationChanges {
    pub category_id: Option<CategoryId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub requested_amount: Option<Decimal>,
    pub location_city: Option<String>,
    pub location_district: Option<String>,
    pub household_size: Option<i32>,
    pub urgency_level: Option<i32>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CityCount {
    pub city: String,
    pub count: i64,
}

impl Application {
    pub async fn find_by_id_optional(id: ApplicationId, pool: &PgPool) -> Result<Option<Self>> {
        let application = sqlx::query_as::<_, Self>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(application)
    }

    /// Row lock that serializes document uploads for one application.
    pub async fn lock(id: ApplicationId, conn: &mut PgConnection) -> Result<Option<Self>> {
        let application =
            sqlx::query_as::<_, Self>("SELECT * FROM applications WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(conn)
                .await?;
        Ok(application)
    }

    pub async fn find_for_applicant(applicant_id: UserId, pool: &PgPool) -> Result<Vec<Self>> {
        let applications = sqlx::query_as::<_, Self>(
            "SELECT * FROM applications WHERE applicant_id = $1 ORDER BY created_at DESC",
        )
        .bind(applicant_id)
        .fetch_all(pool)
        .await?;
        Ok(applications)
    }

    pub async fn find_assigned(
        organization_id: OrganizationId,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let applications = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM applications
            WHERE assigned_organization_id = $1
            ORDER BY urgency_level DESC, created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(organization_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(applications)
    }

    pub async fn count_assigned(organization_id: OrganizationId, pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM applications WHERE assigned_organization_id = $1",
        )
        .bind(organization_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Most urgent first, then oldest.
    pub async fn find_filtered(
        status: Option<ApplicationStatus>,
        city: Option<&str>,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let applications = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM applications
            WHERE ($1::application_status IS NULL OR status = $1)
              AND ($2::text IS NULL OR location_city ILIKE $2)
            ORDER BY urgency_level DESC, created_at ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(status)
        .bind(city)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(applications)
    }

    pub async fn count_filtered(
        status: Option<ApplicationStatus>,
        city: Option<&str>,
        pool: &PgPool,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM applications
            WHERE ($1::application_status IS NULL OR status = $1)
              AND ($2::text IS NULL OR location_city ILIKE $2)
            "#,
        )
        .bind(status)
        .bind(city)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn count_grouped_by_status(pool: &PgPool) -> Result<Vec<(ApplicationStatus, i64)>> {
        let rows = sqlx::query_as::<_, (ApplicationStatus, i64)>(
            "SELECT status, COUNT(*) FROM applications GROUP BY status",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_by_city(limit: i64, pool: &PgPool) -> Result<Vec<CityCount>> {
        let rows = sqlx::query_as::<_, CityCount>(
            r#"
            SELECT location_city AS city, COUNT(*) AS count
            FROM applications
            WHERE location_city IS NOT NULL
            GROUP BY location_city
            ORDER BY count DESC, city ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn create(new: NewApplication, conn: &mut PgConnection) -> Result<Self> {
        let application = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO applications (
                applicant_id, category_id, title, description, requested_amount,
                location_city, location_district, household_size, urgency_level,
                national_id_masked
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(new.applicant_id)
        .bind(new.category_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.requested_amount)
        .bind(&new.location_city)
        .bind(&new.location_district)
        .bind(new.household_size)
        .bind(new.urgency_level)
        .bind(&new.national_id_masked)
        .fetch_one(conn)
        .await?;
        Ok(application)
    }

    /// `None` once the application has left PENDING.
    pub async fn update_pending(
        id: ApplicationId,
        changes: ApplicationChanges,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let application = sqlx::query_as::<_, Self>(
            r#"
            UPDATE applications SET
                category_id = COALESCE($2, category_id),
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                requested_amount = COALESCE($5, requested_amount),
                location_city = COALESCE($6, location_city),
                location_district = COALESCE($7, location_district),
                household_size = COALESCE($8, household_size),
                urgency_level = COALESCE($9, urgency_level),
                updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.category_id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.requested_amount)
        .bind(changes.location_city)
        .bind(changes.location_district)
        .bind(changes.household_size)
        .bind(changes.urgency_level)
        .fetch_optional(pool)
        .await?;
        Ok(application)
    }

    pub async fn delete_pending(id: ApplicationId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1 AND status = 'PENDING'")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// `from` -> `to`. The rejection reason is kept only for REJECTED; the
    /// organization, when given, replaces the current assignment.
    pub async fn review(
        id: ApplicationId,
        from: ApplicationStatus,
        to: ApplicationStatus,
        rejection_reason: Option<&str>,
        organization_id: Option<OrganizationId>,
        reviewer: UserId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let application = sqlx::query_as::<_, Self>(
            r#"
            UPDATE applications SET
                status = $3,
                rejection_reason = CASE WHEN $3 = 'REJECTED'::application_status THEN $4 ELSE NULL END,
                assigned_organization_id = COALESCE($5, assigned_organization_id),
                reviewed_by = $6,
                reviewed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(rejection_reason)
        .bind(organization_id)
        .bind(reviewer)
        .fetch_optional(pool)
        .await?;
        Ok(application)
    }

    pub async fn assign_organization(
        id: ApplicationId,
        organization_id: OrganizationId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let application = sqlx::query_as::<_, Self>(
            r#"
            UPDATE applications SET
                assigned_organization_id = $2,
                assigned_campaign_id = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status IN ('PENDING', 'IN_REVIEW', 'APPROVED')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(pool)
        .await?;
        Ok(application)
    }

    /// Only the assigned organization, and only while APPROVED.
    pub async fn assign_campaign(
        id: ApplicationId,
        organization_id: OrganizationId,
        campaign_id: CampaignId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let application = sqlx::query_as::<_, Self>(
            r#"
            UPDATE applications SET
                assigned_campaign_id = $3,
                updated_at = NOW()
            WHERE id = $1 AND assigned_organization_id = $2 AND status = 'APPROVED'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(campaign_id)
        .fetch_optional(pool)
        .await?;
        Ok(application)
    }

    pub async fn complete(
        id: ApplicationId,
        organization_id: OrganizationId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let application = sqlx::query_as::<_, Self>(
            r#"
            UPDATE applications SET
                status = 'COMPLETED',
                completed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND assigned_organization_id = $2 AND status = 'APPROVED'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(pool)
        .await?;
        Ok(application)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    #[test]
    fn review_moves_forward_only() {
        assert!(Pending.can_review_to(InReview));
        assert!(Pending.can_review_to(Approved));
        assert!(InReview.can_review_to(Rejected));
        assert!(!InReview.can_review_to(Pending));
        assert!(!Approved.can_review_to(Rejected));
        assert!(!Rejected.can_review_to(Approved));
    }

    #[test]
    fn admins_cannot_complete() {
        for from in [Pending, InReview, Approved] {
            assert!(!from.can_review_to(Completed));
        }
    }

    #[test]
    fn closed_applications_cannot_be_routed() {
        assert!(Approved.is_routable());
        assert!(!Rejected.is_routable());
        assert!(!Completed.is_routable());
    }
}
