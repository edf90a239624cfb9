use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{CampaignId, EvidenceId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "evidence_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceType {
    Invoice,
    Receipt,
    Photo,
    Contract,
    BankStatement,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "evidence_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceStatus {
    Pending,
    Approved,
    Rejected,
}

impl EvidenceStatus {
    /// Owners may still change the record.
    pub fn is_editable(&self) -> bool {
        !matches!(self, EvidenceStatus::Approved)
    }
}

/// Proof of how a completed campaign spent its money.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Evidence {
    pub id: EvidenceId,
    pub campaign_id: CampaignId,
    pub evidence_type: EvidenceType,
    pub title: String,
    pub description: Option<String>,
    pub amount_spent: Decimal,
    pub spend_date: Option<NaiveDate>,
    pub vendor_name: Option<String>,
    pub vendor_tax_number: Option<String>,
    pub invoice_number: Option<String>,
    pub status: EvidenceStatus,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub uploaded_by: UserId,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEvidence {
    pub campaign_id: CampaignId,
    pub evidence_type: EvidenceType,
    pub title: String,
    pub description: Option<String>,
    pub amount_spent: Decimal,
    pub spend_date: Option<NaiveDate>,
    pub vendor_name: Option<String>,
    pub vendor_tax_number: Option<String>,
    pub invoice_number: Option<String>,
    pub uploaded_by: UserId,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct EvidenceChanges {
    pub evidence_type: Option<EvidenceType>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount_spent: Option<Decimal>,
    pub spend_date: Option<NaiveDate>,
    pub vendor_name: Option<String>,
    pub vendor_tax_number: Option<String>,
    pub invoice_number: Option<String>,
}

impl Evidence {
    /// Uploaded no later than the campaign's evidence deadline.
    pub fn is_on_time(&self, deadline: Option<DateTime<Utc>>) -> bool {
        deadline.map_or(true, |d| self.uploaded_at <= d)
    }

    pub async fn find_by_id_optional(id: EvidenceId, pool: &PgPool) -> Result<Option<Self>> {
        let evidence = sqlx::query_as::<_, Self>("SELECT * FROM evidences WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(evidence)
    }

    pub async fn find_for_uploader(
        uploaded_by: UserId,
        campaign_id: Option<CampaignId>,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let evidences = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM evidences
            WHERE uploaded_by = $1 AND ($2::uuid IS NULL OR campaign_id = $2)
            ORDER BY uploaded_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(uploaded_by)
        .bind(campaign_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(evidences)
    }

    pub async fn count_for_uploader(
        uploaded_by: UserId,
        campaign_id: Option<CampaignId>,
        pool: &PgPool,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM evidences WHERE uploaded_by = $1 AND ($2::uuid IS NULL OR campaign_id = $2)",
        )
        .bind(uploaded_by)
        .bind(campaign_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn find_approved_for_campaign(
        campaign_id: CampaignId,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let evidences = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM evidences
            WHERE campaign_id = $1 AND status = 'APPROVED'
            ORDER BY spend_date DESC NULLS LAST, uploaded_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(campaign_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(evidences)
    }

    pub async fn count_approved_for_campaign(campaign_id: CampaignId, pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM evidences WHERE campaign_id = $1 AND status = 'APPROVED'",
        )
        .bind(campaign_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn find_by_status(
        status: Option<EvidenceStatus>,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let evidences = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM evidences
            WHERE ($1::evidence_status IS NULL OR status = $1)
            ORDER BY uploaded_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(evidences)
    }

    pub async fn count_by_status(status: Option<EvidenceStatus>, pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM evidences WHERE ($1::evidence_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Sum of approved spending on a campaign.
    pub async fn approved_total(campaign_id: CampaignId, pool: &PgPool) -> Result<Decimal> {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_spent), 0) FROM evidences WHERE campaign_id = $1 AND status = 'APPROVED'",
        )
        .bind(campaign_id)
        .fetch_one(pool)
        .await?;
        Ok(total)
    }

    /// Sum of PENDING and APPROVED spending, optionally leaving one record out.
    pub async fn claimed_total(
        campaign_id: CampaignId,
        except: Option<EvidenceId>,
        conn: &mut PgConnection,
    ) -> Result<Decimal> {
        let total: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount_spent), 0) FROM evidences
            WHERE campaign_id = $1
              AND status IN ('PENDING', 'APPROVED')
              AND ($2::uuid IS NULL OR id <> $2)
            "#,
        )
        .bind(campaign_id)
        .bind(except)
        .fetch_one(conn)
        .await?;
        Ok(total)
    }

    pub async fn create(new: NewEvidence, conn: &mut PgConnection) -> Result<Self> {
        let evidence = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO evidences (
                campaign_id, evidence_type, title, description, amount_spent, spend_date,
                vendor_name, vendor_tax_number, invoice_number, uploaded_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(new.campaign_id)
        .bind(new.evidence_type)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.amount_spent)
        .bind(new.spend_date)
        .bind(&new.vendor_name)
        .bind(&new.vendor_tax_number)
        .bind(&new.invoice_number)
        .bind(new.uploaded_by)
        .fetch_one(conn)
        .await?;
        Ok(evidence)
    }

    /// Applies the changes. A REJECTED record goes back to PENDING with its
    /// review cleared.
    pub async fn update(
        id: EvidenceId,
        changes: EvidenceChanges,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let evidence = sqlx::query_as::<_, Self>(
            r#"
            UPDATE evidences SET
                evidence_type = COALESCE($2, evidence_type),
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                amount_spent = COALESCE($5, amount_spent),
                spend_date = COALESCE($6, spend_date),
                vendor_name = COALESCE($7, vendor_name),
                vendor_tax_number = COALESCE($8, vendor_tax_number),
                invoice_number = COALESCE($9, invoice_number),
                status = 'PENDING',
                reviewed_by = NULL,
                reviewed_at = NULL,
                rejection_reason = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status <> 'APPROVED'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.evidence_type)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.amount_spent)
        .bind(changes.spend_date)
        .bind(&changes.vendor_name)
        .bind(&changes.vendor_tax_number)
        .bind(&changes.invoice_number)
        .fetch_optional(conn)
        .await?;
        Ok(evidence)
    }

    pub async fn delete(id: EvidenceId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM evidences WHERE id = $1 AND status <> 'APPROVED'")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// PENDING -> APPROVED/REJECTED. `None` when someone reviewed it first.
    pub async fn review(
        id: EvidenceId,
        status: EvidenceStatus,
        reviewer: UserId,
        rejection_reason: Option<&str>,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let evidence = sqlx::query_as::<_, Self>(
            r#"
            UPDATE evidences SET
                status = $2,
                reviewed_by = $3,
                reviewed_at = NOW(),
                rejection_reason = $4,
                updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(reviewer)
        .bind(rejection_reason)
        .fetch_optional(conn)
        .await?;
        Ok(evidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn evidence(uploaded_at: DateTime<Utc>) -> Evidence {
        Evidence {
            id: EvidenceId::new(),
            campaign_id: CampaignId::new(),
            evidence_type: EvidenceType::Invoice,
            title: "Kırtasiye faturası".to_string(),
            description: None,
            amount_spent: Decimal::from(1500),
            spend_date: None,
            vendor_name: None,
            vendor_tax_number: None,
            invoice_number: None,
            status: EvidenceStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            uploaded_by: UserId::new(),
            uploaded_at,
            updated_at: uploaded_at,
        }
    }

    #[test]
    fn on_time_up_to_and_including_the_deadline() {
        let deadline = Utc::now();
        assert!(evidence(deadline).is_on_time(Some(deadline)));
        assert!(evidence(deadline - Duration::days(3)).is_on_time(Some(deadline)));
        assert!(!evidence(deadline + Duration::seconds(1)).is_on_time(Some(deadline)));
        assert!(evidence(deadline).is_on_time(None));
    }

    #[test]
    fn approved_evidence_is_frozen() {
        assert!(EvidenceStatus::Pending.is_editable());
        assert!(EvidenceStatus::Rejected.is_editable());
        assert!(!EvidenceStatus::Approved.is_editable());
    }
}
