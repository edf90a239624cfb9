use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{PgConnection, PgPool};

use crate::common::{BankTransferId, CampaignId, DonationId, OrganizationId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "bank_transfer_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BankTransferStatus {
    Pending,
    Matched,
    Expired,
    Cancelled,
}

/// Pledge to wire money, identified by the code the donor writes in the
/// transfer description.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BankTransferReference {
    pub id: BankTransferId,
    pub reference_code: String,
    pub campaign_id: CampaignId,
    pub organization_id: OrganizationId,
    pub donor_id: UserId,
    pub expected_amount: Decimal,
    pub sender_name: Option<String>,
    pub bank_account_snapshot: JsonValue,
    pub status: BankTransferStatus,
    pub expires_at: DateTime<Utc>,
    pub matched_donation_id: Option<DonationId>,
    pub matched_at: Option<DateTime<Utc>>,
    pub matched_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBankTransfer {
    pub reference_code: String,
    pub campaign_id: CampaignId,
    pub organization_id: OrganizationId,
    pub donor_id: UserId,
    pub expected_amount: Decimal,
    pub sender_name: Option<String>,
    pub bank_account_snapshot: JsonValue,
    pub expires_at: DateTime<Utc>,
}

impl BankTransferReference {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub async fn code_exists(code: &str, pool: &PgPool) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM bank_transfer_references WHERE reference_code = $1)",
        )
        .bind(code)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    pub async fn find_by_code(code: &str, pool: &PgPool) -> Result<Option<Self>> {
        let reference = sqlx::query_as::<_, Self>(
            "SELECT * FROM bank_transfer_references WHERE reference_code = $1",
        )
        .bind(code)
        .fetch_optional(pool)
        .await?;
        Ok(reference)
    }

    pub async fn lock_by_code(code: &str, conn: &mut PgConnection) -> Result<Option<Self>> {
        let reference = sqlx::query_as::<_, Self>(
            "SELECT * FROM bank_transfer_references WHERE reference_code = $1 FOR UPDATE",
        )
        .bind(code)
        .fetch_optional(conn)
        .await?;
        Ok(reference)
    }

    pub async fn find_pending_for_donor(donor_id: UserId, pool: &PgPool) -> Result<Vec<Self>> {
        let references = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM bank_transfer_references
            WHERE donor_id = $1 AND status = 'pending'
            ORDER BY created_at DESC
            "#,
        )
        .bind(donor_id)
        .fetch_all(pool)
        .await?;
        Ok(references)
    }

    pub async fn find_pending(limit: i64, offset: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let references = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM bank_transfer_references
            WHERE status = 'pending'
            ORDER BY expires_at ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(references)
    }

    pub async fn count_pending(pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bank_transfer_references WHERE status = 'pending'",
        )
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn create(new: NewBankTransfer, pool: &PgPool) -> Result<Self> {
        let reference = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO bank_transfer_references (
                reference_code, campaign_id, organization_id, donor_id,
                expected_amount, sender_name, bank_account_snapshot, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&new.reference_code)
        .bind(new.campaign_id)
        .bind(new.organization_id)
        .bind(new.donor_id)
        .bind(new.expected_amount)
        .bind(&new.sender_name)
        .bind(&new.bank_account_snapshot)
        .bind(new.expires_at)
        .fetch_one(pool)
        .await?;
        Ok(reference)
    }

    /// pending -> cancelled
    pub async fn cancel(id: BankTransferId, pool: &PgPool) -> Result<Option<Self>> {
        let reference = sqlx::query_as::<_, Self>(
            r#"
            UPDATE bank_transfer_references SET status = 'cancelled'
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(reference)
    }

    pub async fn mark_expired(id: BankTransferId, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "UPDATE bank_transfer_references SET status = 'expired' WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn mark_matched(
        id: BankTransferId,
        donation_id: DonationId,
        admin_id: UserId,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let reference = sqlx::query_as::<_, Self>(
            r#"
            UPDATE bank_transfer_references SET
                status = 'matched',
                matched_donation_id = $2,
                matched_at = NOW(),
                matched_by = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(donation_id)
        .bind(admin_id)
        .fetch_one(conn)
        .await?;
        Ok(reference)
    }

    /// Expires every pending reference past its deadline and returns them.
    pub async fn expire_overdue(now: DateTime<Utc>, pool: &PgPool) -> Result<Vec<Self>> {
        let references = sqlx::query_as::<_, Self>(
            r#"
            UPDATE bank_transfer_references SET status = 'expired'
            WHERE status = 'pending' AND expires_at < $1
            RETURNING *
            "#,
        )
        .bind(now)
        .fetch_all(pool)
        .await?;
        Ok(references)
    }
}
