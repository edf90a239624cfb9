use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{CampaignId, OrganizationId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "campaign_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Draft,
    PendingApproval,
    Active,
    Paused,
    Completed,
    Cancelled,
    Rejected,
}

impl CampaignStatus {
    pub fn can_transition_to(&self, next: CampaignStatus) -> bool {
        use CampaignStatus::*;
        matches!(
            (self, next),
            (Draft, PendingApproval)
                | (PendingApproval, Active)
                | (PendingApproval, Rejected)
                | (Rejected, Draft)
                | (Active, Paused)
                | (Paused, Active)
                | (Active, Completed)
                | (Draft, Cancelled)
                | (PendingApproval, Cancelled)
                | (Active, Cancelled)
                | (Paused, Cancelled)
        )
    }

    /// Visible to anonymous visitors.
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            CampaignStatus::Active | CampaignStatus::Paused | CampaignStatus::Completed
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CampaignStatus::Completed | CampaignStatus::Cancelled)
    }

    /// Statuses in which the target amount may still change.
    pub fn allows_financial_edits(&self) -> bool {
        matches!(self, CampaignStatus::Draft | CampaignStatus::Rejected)
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStatus::Draft => write!(f, "DRAFT"),
            CampaignStatus::PendingApproval => write!(f, "PENDING_APPROVAL"),
            CampaignStatus::Active => write!(f, "ACTIVE"),
            CampaignStatus::Paused => write!(f, "PAUSED"),
            CampaignStatus::Completed => write!(f, "COMPLETED"),
            CampaignStatus::Cancelled => write!(f, "CANCELLED"),
            CampaignStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "DRAFT" => Ok(CampaignStatus::Draft),
            "PENDING_APPROVAL" => Ok(CampaignStatus::PendingApproval),
            "ACTIVE" => Ok(CampaignStatus::Active),
            "PAUSED" => Ok(CampaignStatus::Paused),
            "COMPLETED" => Ok(CampaignStatus::Completed),
            "CANCELLED" => Ok(CampaignStatus::Cancelled),
            "REJECTED" => Ok(CampaignStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid campaign status: {}", s)),
        }
    }
}

/// Ordering of the public campaign list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignSort {
    #[default]
    Newest,
    EndingSoon,
    MostFunded,
}

impl CampaignSort {
    fn order_by(&self) -> &'static str {
        match self {
            CampaignSort::Newest => "c.created_at DESC",
            CampaignSort::EndingSoon => "c.end_date ASC NULLS LAST, c.created_at DESC",
            CampaignSort::MostFunded => "c.collected_amount DESC, c.created_at DESC",
        }
    }
}

/// Filters for the public list. Only ACTIVE campaigns are ever returned.
#[derive(Debug, Clone, Default)]
pub struct PublicCampaignFilter {
    pub query: Option<String>,
    pub category_slug: Option<String>,
    pub city: Option<String>,
    pub urgent: Option<bool>,
    pub featured: Option<bool>,
    pub sort: CampaignSort,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Campaign {
    pub id: CampaignId,
    pub organization_id: OrganizationId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub short_description: Option<String>,
    pub target_amount: Decimal,
    pub collected_amount: Decimal,
    pub donor_count: i32,
    pub currency: String,
    pub status: CampaignStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cover_image_url: Option<String>,
    pub is_featured: bool,
    pub is_urgent: bool,
    pub evidence_deadline_days: i32,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<UserId>,
    pub rejection_reason: Option<String>,
    pub created_by: UserId,
    pub extension_count: i32,
    pub beneficiary_count: Option<i32>,
    pub location_city: Option<String>,
    pub evidence_penalty_applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub organization_id: OrganizationId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub short_description: Option<String>,
    pub target_amount: Decimal,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub cover_image_url: Option<String>,
    pub is_urgent: bool,
    pub evidence_deadline_days: i32,
    pub created_by: UserId,
    pub beneficiary_count: Option<i32>,
    pub location_city: Option<String>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct CampaignChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub target_amount: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub cover_image_url: Option<String>,
    pub beneficiary_count: Option<i32>,
    pub location_city: Option<String>,
}

impl Campaign {
    /// Last day evidence counts as on time.
    pub fn evidence_deadline(&self) -> Option<DateTime<Utc>> {
        self.completed_at
            .map(|at| at + chrono::Duration::days(self.evidence_deadline_days as i64))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn find_by_id_optional(id: CampaignId, pool: &PgPool) -> Result<Option<Self>> {
        let campaign = sqlx::query_as::<_, Self>("SELECT * FROM campaigns WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(campaign)
    }

    pub async fn find_by_slug(slug: &str, pool: &PgPool) -> Result<Option<Self>> {
        let campaign = sqlx::query_as::<_, Self>("SELECT * FROM campaigns WHERE slug = $1")
            .bind(slug)
            .fetch_optional(pool)
            .await?;
        Ok(campaign)
    }

    pub async fn find_many(ids: &[CampaignId], pool: &PgPool) -> Result<Vec<Self>> {
        let campaigns = sqlx::query_as::<_, Self>("SELECT * FROM campaigns WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await?;
        Ok(campaigns)
    }

    /// Row lock for updates that must not interleave with donations.
    pub async fn lock(id: CampaignId, conn: &mut PgConnection) -> Result<Option<Self>> {
        let campaign =
            sqlx::query_as::<_, Self>("SELECT * FROM campaigns WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(conn)
                .await?;
        Ok(campaign)
    }

    pub async fn slug_exists(slug: &str, pool: &PgPool) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM campaigns WHERE slug = $1)")
            .bind(slug)
            .fetch_one(pool)
            .await?;
        Ok(exists)
    }

    pub async fn count_for_organization(
        organization_id: OrganizationId,
        conn: &mut PgConnection,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM campaigns WHERE organization_id = $1")
            .bind(organization_id)
            .fetch_one(conn)
            .await?;
        Ok(count)
    }

    pub async fn count_active_for_organization(
        organization_id: OrganizationId,
        pool: &PgPool,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM campaigns WHERE organization_id = $1 AND status = 'ACTIVE'",
        )
        .bind(organization_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn search_public(
        filter: &PublicCampaignFilter,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let sql = format!(
            r#"
            SELECT c.* FROM campaigns c
            WHERE c.status = 'ACTIVE'
              AND ($1::text IS NULL
                   OR c.title ILIKE '%' || $1 || '%'
                   OR c.description ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR EXISTS(
                    SELECT 1 FROM campaign_categories cc
                    JOIN categories cat ON cat.id = cc.category_id
                    WHERE cc.campaign_id = c.id AND cat.slug = $2))
              AND ($3::text IS NULL OR c.location_city ILIKE $3)
              AND ($4::boolean IS NULL OR c.is_urgent = $4)
              AND ($5::boolean IS NULL OR c.is_featured = $5)
            ORDER BY {}
            LIMIT $6 OFFSET $7
            "#,
            filter.sort.order_by()
        );
        let campaigns = sqlx::query_as::<_, Self>(&sql)
            .bind(&filter.query)
            .bind(&filter.category_slug)
            .bind(&filter.city)
            .bind(filter.urgent)
            .bind(filter.featured)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
        Ok(campaigns)
    }

    pub async fn count_public(filter: &PublicCampaignFilter, pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM campaigns c
            WHERE c.status = 'ACTIVE'
              AND ($1::text IS NULL
                   OR c.title ILIKE '%' || $1 || '%'
                   OR c.description ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR EXISTS(
                    SELECT 1 FROM campaign_categories cc
                    JOIN categories cat ON cat.id = cc.category_id
                    WHERE cc.campaign_id = c.id AND cat.slug = $2))
              AND ($3::text IS NULL OR c.location_city ILIKE $3)
              AND ($4::boolean IS NULL OR c.is_urgent = $4)
              AND ($5::boolean IS NULL OR c.is_featured = $5)
            "#,
        )
        .bind(&filter.query)
        .bind(&filter.category_slug)
        .bind(&filter.city)
        .bind(filter.urgent)
        .bind(filter.featured)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn find_featured(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let campaigns = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM campaigns
            WHERE status = 'ACTIVE' AND is_featured = true
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(campaigns)
    }

    /// Urgent campaigns, closest deadline first.
    pub async fn find_urgent(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let campaigns = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM campaigns
            WHERE status = 'ACTIVE' AND is_urgent = true
            ORDER BY end_date ASC NULLS LAST
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(campaigns)
    }

    pub async fn find_for_organization(
        organization_id: OrganizationId,
        status: Option<CampaignStatus>,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let campaigns = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM campaigns
            WHERE organization_id = $1 AND ($2::campaign_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(organization_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(campaigns)
    }

    pub async fn count_for_organization_filtered(
        organization_id: OrganizationId,
        status: Option<CampaignStatus>,
        pool: &PgPool,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM campaigns WHERE organization_id = $1 AND ($2::campaign_status IS NULL OR status = $2)",
        )
        .bind(organization_id)
        .bind(status)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn find_by_status(
        status: Option<CampaignStatus>,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let campaigns = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM campaigns
            WHERE ($1::campaign_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(campaigns)
    }

    pub async fn count_by_status(status: Option<CampaignStatus>, pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM campaigns WHERE ($1::campaign_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn count_grouped_by_status(pool: &PgPool) -> Result<Vec<(CampaignStatus, i64)>> {
        let rows = sqlx::query_as::<_, (CampaignStatus, i64)>(
            "SELECT status, COUNT(*) FROM campaigns GROUP BY status",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn followed_by(
        user_id: UserId,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let campaigns = sqlx::query_as::<_, Self>(
            r#"
            SELECT c.* FROM campaigns c
            JOIN campaign_followers f ON f.campaign_id = c.id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(campaigns)
    }

    // =========================================================================
    // Scheduler queries
    // =========================================================================

    /// Active campaigns that reached their target or ran past their end date.
    pub async fn find_due_for_review(now: DateTime<Utc>, pool: &PgPool) -> Result<Vec<Self>> {
        let campaigns = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM campaigns
            WHERE status = 'ACTIVE'
              AND (collected_amount >= target_amount OR end_date < $1)
            ORDER BY end_date ASC NULLS LAST
            "#,
        )
        .bind(now)
        .fetch_all(pool)
        .await?;
        Ok(campaigns)
    }

    /// Completed campaigns that have not been penalized for missing evidence.
    pub async fn find_completed_without_penalty(pool: &PgPool) -> Result<Vec<Self>> {
        let campaigns = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM campaigns
            WHERE status = 'COMPLETED'
              AND completed_at IS NOT NULL
              AND evidence_penalty_applied_at IS NULL
            ORDER BY completed_at ASC
            "#,
        )
        .fetch_all(pool)
        .await?;
        Ok(campaigns)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub async fn create(new: NewCampaign, conn: &mut PgConnection) -> Result<Self> {
        let campaign = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO campaigns (
                organization_id, title, slug, description, short_description,
                target_amount, start_date, end_date, cover_image_url, is_urgent,
                evidence_deadline_days, created_by, beneficiary_count, location_city
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(new.organization_id)
        .bind(&new.title)
        .bind(&new.slug)
        .bind(&new.description)
        .bind(&new.short_description)
        .bind(new.target_amount)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(&new.cover_image_url)
        .bind(new.is_urgent)
        .bind(new.evidence_deadline_days)
        .bind(new.created_by)
        .bind(new.beneficiary_count)
        .bind(&new.location_city)
        .fetch_one(conn)
        .await?;
        Ok(campaign)
    }

    pub async fn update(
        id: CampaignId,
        changes: CampaignChanges,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let campaign = sqlx::query_as::<_, Self>(
            r#"
            UPDATE campaigns SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                short_description = COALESCE($4, short_description),
                target_amount = COALESCE($5, target_amount),
                start_date = COALESCE($6, start_date),
                end_date = COALESCE($7, end_date),
                cover_image_url = COALESCE($8, cover_image_url),
                beneficiary_count = COALESCE($9, beneficiary_count),
                location_city = COALESCE($10, location_city),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.short_description)
        .bind(changes.target_amount)
        .bind(changes.start_date)
        .bind(changes.end_date)
        .bind(&changes.cover_image_url)
        .bind(changes.beneficiary_count)
        .bind(&changes.location_city)
        .fetch_one(conn)
        .await?;
        Ok(campaign)
    }

    pub async fn delete(id: CampaignId, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Compare-and-set status change. `None` when the row was no longer in
    /// `from`. Entering COMPLETED stamps `completed_at`; leaving REJECTED
    /// clears the rejection reason.
    pub async fn transition(
        id: CampaignId,
        from: CampaignStatus,
        to: CampaignStatus,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let campaign = sqlx::query_as::<_, Self>(
            r#"
            UPDATE campaigns SET
                status = $3,
                completed_at = CASE WHEN $3 = 'COMPLETED'::campaign_status THEN NOW() ELSE completed_at END,
                rejection_reason = CASE WHEN $2 = 'REJECTED'::campaign_status THEN NULL ELSE rejection_reason END,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(conn)
        .await?;
        Ok(campaign)
    }

    /// PENDING_APPROVAL to ACTIVE. Start date defaults to now.
    pub async fn approve(id: CampaignId, admin_id: UserId, pool: &PgPool) -> Result<Option<Self>> {
        let campaign = sqlx::query_as::<_, Self>(
            r#"
            UPDATE campaigns SET
                status = 'ACTIVE',
                approved_at = NOW(),
                approved_by = $2,
                start_date = COALESCE(start_date, NOW()),
                rejection_reason = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING_APPROVAL'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(admin_id)
        .fetch_optional(pool)
        .await?;
        Ok(campaign)
    }

    pub async fn reject(id: CampaignId, reason: &str, pool: &PgPool) -> Result<Option<Self>> {
        let campaign = sqlx::query_as::<_, Self>(
            r#"
            UPDATE campaigns SET
                status = 'REJECTED',
                rejection_reason = $2,
                updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING_APPROVAL'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .fetch_optional(pool)
        .await?;
        Ok(campaign)
    }

    pub async fn set_flags(
        id: CampaignId,
        is_featured: Option<bool>,
        is_urgent: Option<bool>,
        pool: &PgPool,
    ) -> Result<Self> {
        let campaign = sqlx::query_as::<_, Self>(
            r#"
            UPDATE campaigns SET
                is_featured = COALESCE($2, is_featured),
                is_urgent = COALESCE($3, is_urgent),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(is_featured)
        .bind(is_urgent)
        .fetch_one(pool)
        .await?;
        Ok(campaign)
    }

    /// Atomic increment of the running totals.
    pub async fn record_donation(
        id: CampaignId,
        amount: Decimal,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let campaign = sqlx::query_as::<_, Self>(
            r#"
            UPDATE campaigns SET
                collected_amount = collected_amount + $2,
                donor_count = donor_count + 1,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(amount)
        .fetch_one(conn)
        .await?;
        Ok(campaign)
    }

    /// Reverses `record_donation` for a refund, never going below zero.
    pub async fn reverse_donation(
        id: CampaignId,
        amount: Decimal,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let campaign = sqlx::query_as::<_, Self>(
            r#"
            UPDATE campaigns SET
                collected_amount = GREATEST(collected_amount - $2, 0),
                donor_count = GREATEST(donor_count - 1, 0),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(amount)
        .fetch_one(conn)
        .await?;
        Ok(campaign)
    }

    /// Pushes the end date of an ACTIVE campaign by `days`. `None` when the
    /// campaign left ACTIVE, another run already extended it from
    /// `seen_extensions`, or `max_extensions` was reached.
    pub async fn extend_end_date(
        id: CampaignId,
        days: i64,
        seen_extensions: i32,
        max_extensions: i32,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let campaign = sqlx::query_as::<_, Self>(
            r#"
            UPDATE campaigns SET
                end_date = end_date + make_interval(days => $2::int),
                extension_count = extension_count + 1,
                updated_at = NOW()
            WHERE id = $1
              AND status = 'ACTIVE'
              AND extension_count = $3
              AND extension_count < $4
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(days as i32)
        .bind(seen_extensions)
        .bind(max_extensions)
        .fetch_optional(pool)
        .await?;
        Ok(campaign)
    }

    /// Returns false when another run already stamped the penalty.
    pub async fn mark_penalty_applied(id: CampaignId, conn: &mut PgConnection) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE campaigns SET evidence_penalty_applied_at = NOW()
            WHERE id = $1 AND evidence_penalty_applied_at IS NULL
            "#,
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CampaignStatus::*;

    const ALL: [CampaignStatus; 7] = [
        Draft,
        PendingApproval,
        Active,
        Paused,
        Completed,
        Cancelled,
        Rejected,
    ];

    #[test]
    fn owner_and_admin_paths_are_allowed() {
        assert!(Draft.can_transition_to(PendingApproval));
        assert!(PendingApproval.can_transition_to(Active));
        assert!(PendingApproval.can_transition_to(Rejected));
        assert!(Rejected.can_transition_to(Draft));
        assert!(Active.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Active));
        assert!(Active.can_transition_to(Completed));
        assert!(Paused.can_transition_to(Cancelled));
    }

    #[test]
    fn terminal_states_go_nowhere() {
        for next in ALL {
            assert!(!Completed.can_transition_to(next), "COMPLETED -> {}", next);
            assert!(!Cancelled.can_transition_to(next), "CANCELLED -> {}", next);
        }
    }

    #[test]
    fn shortcuts_are_refused() {
        assert!(!Draft.can_transition_to(Active));
        assert!(!Paused.can_transition_to(Completed));
        assert!(!Rejected.can_transition_to(Active));
        assert!(!Rejected.can_transition_to(Cancelled));
        for status in ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn public_statuses() {
        let public: Vec<_> = ALL.into_iter().filter(CampaignStatus::is_public).collect();
        assert_eq!(public, vec![Active, Paused, Completed]);
    }

    #[test]
    fn sort_parses_snake_case() {
        let sort: CampaignSort = serde_json::from_str("\"ending_soon\"").unwrap();
        assert_eq!(sort, CampaignSort::EndingSoon);
        assert_eq!(CampaignSort::default(), CampaignSort::Newest);
    }
}
