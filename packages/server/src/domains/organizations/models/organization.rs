use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{OrganizationId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "organization_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganizationType {
    Foundation,
    Association,
    Ngo,
}

impl std::fmt::Display for OrganizationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrganizationType::Foundation => write!(f, "FOUNDATION"),
            OrganizationType::Association => write!(f, "ASSOCIATION"),
            OrganizationType::Ngo => write!(f, "NGO"),
        }
    }
}

impl std::str::FromStr for OrganizationType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "FOUNDATION" => Ok(OrganizationType::Foundation),
            "ASSOCIATION" => Ok(OrganizationType::Association),
            "NGO" => Ok(OrganizationType::Ngo),
            _ => Err(anyhow::anyhow!("Invalid organization type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "verification_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Pending,
    InReview,
    Approved,
    Rejected,
}

impl VerificationStatus {
    /// Statuses from which the owner may send the organization for review.
    pub fn can_submit(&self) -> bool {
        matches!(self, VerificationStatus::Pending | VerificationStatus::Rejected)
    }

    /// Statuses an admin may approve or reject from.
    pub fn is_reviewable(&self) -> bool {
        matches!(self, VerificationStatus::Pending | VerificationStatus::InReview)
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationStatus::Pending => write!(f, "PENDING"),
            VerificationStatus::InReview => write!(f, "IN_REVIEW"),
            VerificationStatus::Approved => write!(f, "APPROVED"),
            VerificationStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

impl std::str::FromStr for VerificationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(VerificationStatus::Pending),
            "IN_REVIEW" => Ok(VerificationStatus::InReview),
            "APPROVED" => Ok(VerificationStatus::Approved),
            "REJECTED" => Ok(VerificationStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid verification status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    pub id: OrganizationId,
    pub user_id: UserId,
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
    pub verification_status: VerificationStatus,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<UserId>,
    pub rejection_reason: Option<String>,
    pub resubmission_count: i32,
    pub last_resubmission_at: Option<DateTime<Utc>>,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when an organization is first registered
#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub user_id: UserId,
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

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct OrganizationChanges {
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

impl Organization {
    pub fn is_approved(&self) -> bool {
        self.verification_status == VerificationStatus::Approved
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn find_by_id(id: OrganizationId, pool: &PgPool) -> Result<Self> {
        let org = sqlx::query_as::<_, Self>("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(org)
    }

    pub async fn find_by_id_optional(id: OrganizationId, pool: &PgPool) -> Result<Option<Self>> {
        let org = sqlx::query_as::<_, Self>("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(org)
    }

    pub async fn find_by_user(user_id: UserId, pool: &PgPool) -> Result<Option<Self>> {
        let org = sqlx::query_as::<_, Self>("SELECT * FROM organizations WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        Ok(org)
    }

    pub async fn tax_number_taken(
        tax_number: &str,
        except: Option<OrganizationId>,
        pool: &PgPool,
    ) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM organizations
                WHERE tax_number = $1 AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(tax_number)
        .bind(except)
        .fetch_one(pool)
        .await?;
        Ok(taken)
    }

    /// Approved organizations for the public directory, featured first.
    pub async fn search_public(
        query: Option<&str>,
        organization_type: Option<OrganizationType>,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let orgs = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM organizations
            WHERE verification_status = 'APPROVED'
              AND ($1::text IS NULL
                   OR legal_name ILIKE '%' || $1 || '%'
                   OR trade_name ILIKE '%' || $1 || '%')
              AND ($2::organization_type IS NULL OR organization_type = $2)
            ORDER BY is_featured DESC, legal_name ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query)
        .bind(organization_type)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(orgs)
    }

    pub async fn count_public(
        query: Option<&str>,
        organization_type: Option<OrganizationType>,
        pool: &PgPool,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM organizations
            WHERE verification_status = 'APPROVED'
              AND ($1::text IS NULL
                   OR legal_name ILIKE '%' || $1 || '%'
                   OR trade_name ILIKE '%' || $1 || '%')
              AND ($2::organization_type IS NULL OR organization_type = $2)
            "#,
        )
        .bind(query)
        .bind(organization_type)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Admin review queue, oldest first so nothing starves.
    pub async fn find_by_status(
        status: Option<VerificationStatus>,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let orgs = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM organizations
            WHERE ($1::verification_status IS NULL OR verification_status = $1)
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(orgs)
    }

    pub async fn count_by_status(status: Option<VerificationStatus>, pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM organizations WHERE ($1::verification_status IS NULL OR verification_status = $1)",
        )
        .bind(status)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// `(status, count)` pairs for the admin dashboard
    pub async fn count_grouped_by_status(pool: &PgPool) -> Result<Vec<(VerificationStatus, i64)>> {
        let rows = sqlx::query_as::<_, (VerificationStatus, i64)>(
            "SELECT verification_status, COUNT(*) FROM organizations GROUP BY verification_status",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub async fn create(new: NewOrganization, pool: &PgPool) -> Result<Self> {
        let org = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO organizations (
                user_id, organization_type, legal_name, trade_name, tax_number,
                derbis_number, mersis_number, establishment_date, description,
                mission_statement, logo_url, website_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(new.organization_type)
        .bind(&new.legal_name)
        .bind(&new.trade_name)
        .bind(&new.tax_number)
        .bind(&new.derbis_number)
        .bind(&new.mersis_number)
        .bind(new.establishment_date)
        .bind(&new.description)
        .bind(&new.mission_statement)
        .bind(&new.logo_url)
        .bind(&new.website_url)
        .fetch_one(pool)
        .await?;
        Ok(org)
    }

    pub async fn update(id: OrganizationId, changes: OrganizationChanges, pool: &PgPool) -> Result<Self> {
        let org = sqlx::query_as::<_, Self>(
            r#"
            UPDATE organizations SET
                organization_type = COALESCE($2, organization_type),
                legal_name = COALESCE($3, legal_name),
                trade_name = COALESCE($4, trade_name),
                tax_number = COALESCE($5, tax_number),
                derbis_number = COALESCE($6, derbis_number),
                mersis_number = COALESCE($7, mersis_number),
                establishment_date = COALESCE($8, establishment_date),
                description = COALESCE($9, description),
                mission_statement = COALESCE($10, mission_statement),
                logo_url = COALESCE($11, logo_url),
                website_url = COALESCE($12, website_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.organization_type)
        .bind(&changes.legal_name)
        .bind(&changes.trade_name)
        .bind(&changes.tax_number)
        .bind(&changes.derbis_number)
        .bind(&changes.mersis_number)
        .bind(changes.establishment_date)
        .bind(&changes.description)
        .bind(&changes.mission_statement)
        .bind(&changes.logo_url)
        .bind(&changes.website_url)
        .fetch_one(pool)
        .await?;
        Ok(org)
    }

    /// PENDING or REJECTED to IN_REVIEW. A resubmission after rejection bumps
    /// the counter. Returns `None` when the status changed underneath us.
    pub async fn submit_for_review(id: OrganizationId, pool: &PgPool) -> Result<Option<Self>> {
        let org = sqlx::query_as::<_, Self>(
            r#"
            UPDATE organizations SET
                resubmission_count = resubmission_count
                    + CASE WHEN verification_status = 'REJECTED' THEN 1 ELSE 0 END,
                last_resubmission_at = CASE WHEN verification_status = 'REJECTED'
                    THEN NOW() ELSE last_resubmission_at END,
                verification_status = 'IN_REVIEW',
                updated_at = NOW()
            WHERE id = $1 AND verification_status IN ('PENDING', 'REJECTED')
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(org)
    }

    pub async fn approve(
        id: OrganizationId,
        admin_id: UserId,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let org = sqlx::query_as::<_, Self>(
            r#"
            UPDATE organizations SET
                verification_status = 'APPROVED',
                verified_at = NOW(),
                verified_by = $2,
                rejection_reason = NULL,
                updated_at = NOW()
            WHERE id = $1 AND verification_status IN ('PENDING', 'IN_REVIEW')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(admin_id)
        .fetch_optional(conn)
        .await?;
        Ok(org)
    }

    pub async fn reject(id: OrganizationId, reason: &str, pool: &PgPool) -> Result<Option<Self>> {
        let org = sqlx::query_as::<_, Self>(
            r#"
            UPDATE organizations SET
                verification_status = 'REJECTED',
                rejection_reason = $2,
                updated_at = NOW()
            WHERE id = $1 AND verification_status IN ('PENDING', 'IN_REVIEW')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .fetch_optional(pool)
        .await?;
        Ok(org)
    }

    pub async fn set_featured(id: OrganizationId, is_featured: bool, pool: &PgPool) -> Result<Self> {
        let org = sqlx::query_as::<_, Self>(
            "UPDATE organizations SET is_featured = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_featured)
        .fetch_one(pool)
        .await?;
        Ok(org)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_and_rejected_can_be_submitted() {
        assert!(VerificationStatus::Pending.can_submit());
        assert!(VerificationStatus::Rejected.can_submit());
        assert!(!VerificationStatus::InReview.can_submit());
        assert!(!VerificationStatus::Approved.can_submit());
    }

    #[test]
    fn approved_and_rejected_are_not_reviewable() {
        assert!(VerificationStatus::InReview.is_reviewable());
        assert!(VerificationStatus::Pending.is_reviewable());
        assert!(!VerificationStatus::Approved.is_reviewable());
        assert!(!VerificationStatus::Rejected.is_reviewable());
    }

    #[test]
    fn status_parses_from_query_strings() {
        assert_eq!(
            "IN_REVIEW".parse::<VerificationStatus>().unwrap(),
            VerificationStatus::InReview
        );
        assert!("approved".parse::<VerificationStatus>().is_err());
        assert_eq!(OrganizationType::Ngo.to_string(), "NGO");
    }
}
