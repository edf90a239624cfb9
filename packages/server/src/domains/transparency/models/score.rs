use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::common::{CampaignId, EvidenceId, OrganizationId};
use crate::domains::transparency::calculator::{ScoreCounters, ScoreEvent};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TransparencyScore {
    pub id: Uuid,
    pub organization_id: OrganizationId,
    pub current_score: Decimal,
    pub total_campaigns: i32,
    pub completed_campaigns: i32,
    pub on_time_reports: i32,
    pub late_reports: i32,
    pub approved_evidences: i32,
    pub rejected_evidences: i32,
    pub last_calculated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScoreHistory {
    pub id: Uuid,
    pub organization_id: OrganizationId,
    pub previous_score: Option<Decimal>,
    pub new_score: Decimal,
    pub change_amount: Decimal,
    pub change_reason: String,
    pub campaign_id: Option<CampaignId>,
    pub evidence_id: Option<EvidenceId>,
    pub created_at: DateTime<Utc>,
}

/// Leaderboard row before ranking
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeaderboardRow {
    pub organization_id: OrganizationId,
    pub legal_name: String,
    pub logo_url: Option<String>,
    pub current_score: Decimal,
    pub completed_campaigns: i32,
}

impl TransparencyScore {
    pub async fn find_by_organization(
        organization_id: OrganizationId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let score = sqlx::query_as::<_, Self>(
            "SELECT * FROM transparency_scores WHERE organization_id = $1",
        )
        .bind(organization_id)
        .fetch_optional(pool)
        .await?;
        Ok(score)
    }

    /// Row lock held until the surrounding transaction ends.
    pub async fn lock(
        organization_id: OrganizationId,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let score = sqlx::query_as::<_, Self>(
            "SELECT * FROM transparency_scores WHERE organization_id = $1 FOR UPDATE",
        )
        .bind(organization_id)
        .fetch_optional(conn)
        .await?;
        Ok(score)
    }

    /// Returns `None` when the organization already has a score.
    pub async fn insert_initial(
        organization_id: OrganizationId,
        score: Decimal,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO transparency_scores (organization_id, current_score)
            VALUES ($1, $2)
            ON CONFLICT (organization_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(score)
        .fetch_optional(conn)
        .await?;
        Ok(row)
    }

    pub async fn apply_change(
        organization_id: OrganizationId,
        new_score: Decimal,
        delta: ScoreCounters,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let row = sqlx::query_as::<_, Self>(
            r#"
            UPDATE transparency_scores SET
                current_score = $2,
                completed_campaigns = completed_campaigns + $3,
                on_time_reports = on_time_reports + $4,
                late_reports = late_reports + $5,
                approved_evidences = approved_evidences + $6,
                rejected_evidences = rejected_evidences + $7,
                last_calculated_at = NOW()
            WHERE organization_id = $1
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(new_score)
        .bind(delta.completed_campaigns)
        .bind(delta.on_time_reports)
        .bind(delta.late_reports)
        .bind(delta.approved_evidences)
        .bind(delta.rejected_evidences)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    /// Overwrites score and counters with recomputed values.
    pub async fn overwrite(
        organization_id: OrganizationId,
        score: Decimal,
        counters: ScoreCounters,
        total_campaigns: i32,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let row = sqlx::query_as::<_, Self>(
            r#"
            UPDATE transparency_scores SET
                current_score = $2,
                completed_campaigns = $3,
                on_time_reports = $4,
                late_reports = $5,
                approved_evidences = $6,
                rejected_evidences = $7,
                total_campaigns = $8,
                last_calculated_at = NOW()
            WHERE organization_id = $1
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(score)
        .bind(counters.completed_campaigns)
        .bind(counters.on_time_reports)
        .bind(counters.late_reports)
        .bind(counters.approved_evidences)
        .bind(counters.rejected_evidences)
        .bind(total_campaigns)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    pub async fn increment_total_campaigns(
        organization_id: OrganizationId,
        conn: &mut PgConnection,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE transparency_scores SET total_campaigns = total_campaigns + 1 WHERE organization_id = $1",
        )
        .bind(organization_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// APPROVED organizations only, best score first.
    pub async fn leaderboard(limit: i64, offset: i64, pool: &PgPool) -> Result<Vec<LeaderboardRow>> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            r#"
            SELECT s.organization_id, o.legal_name, o.logo_url, s.current_score, s.completed_campaigns
            FROM transparency_scores s
            JOIN organizations o ON o.id = s.organization_id
            WHERE o.verification_status = 'APPROVED'
            ORDER BY s.current_score DESC, s.completed_campaigns DESC, o.legal_name ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn leaderboard_count(pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM transparency_scores s
            JOIN organizations o ON o.id = s.organization_id
            WHERE o.verification_status = 'APPROVED'
            "#,
        )
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}

impl ScoreHistory {
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        organization_id: OrganizationId,
        previous_score: Option<Decimal>,
        new_score: Decimal,
        event: ScoreEvent,
        campaign_id: Option<CampaignId>,
        evidence_id: Option<EvidenceId>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let row = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO transparency_score_history (
                organization_id, previous_score, new_score, change_amount,
                change_reason, campaign_id, evidence_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(previous_score)
        .bind(new_score)
        .bind(event.change_amount())
        .bind(event.as_str())
        .bind(campaign_id)
        .bind(evidence_id)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    pub async fn find_for_organization(
        organization_id: OrganizationId,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM transparency_score_history
            WHERE organization_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(organization_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_for_organization(organization_id: OrganizationId, pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transparency_score_history WHERE organization_id = $1",
        )
        .bind(organization_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Oldest first, for replay.
    pub async fn reasons_in_order(
        organization_id: OrganizationId,
        conn: &mut PgConnection,
    ) -> Result<Vec<String>> {
        let reasons: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT change_reason FROM transparency_score_history
            WHERE organization_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(conn)
        .await?;
        Ok(reasons)
    }
}
