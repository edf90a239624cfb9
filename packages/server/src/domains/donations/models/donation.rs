use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{CampaignId, DonationId, OrganizationId, RequestMeta, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "donation_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DonationStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    BankTransfer,
    Recurring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "refund_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    None,
    Requested,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Donation {
    pub id: DonationId,
    pub campaign_id: CampaignId,
    pub donor_id: Option<UserId>,
    pub amount: Decimal,
    pub currency: String,
    pub status: DonationStatus,
    pub payment_method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub failure_reason: Option<String>,
    pub is_anonymous: bool,
    pub donor_message: Option<String>,
    pub donor_display_name: Option<String>,
    pub guest_email: Option<String>,
    #[serde(skip_serializing)]
    pub ip_address: Option<String>,
    #[serde(skip_serializing)]
    pub user_agent: Option<String>,
    pub source: String,
    pub refund_status: RefundStatus,
    pub refund_reason: Option<String>,
    pub refund_requested_at: Option<DateTime<Utc>>,
    pub refund_processed_at: Option<DateTime<Utc>>,
    pub refund_processed_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload. Status is decided by the caller.
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub campaign_id: CampaignId,
    pub donor_id: Option<UserId>,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub is_anonymous: bool,
    pub donor_message: Option<String>,
    pub donor_display_name: Option<String>,
    pub guest_email: Option<String>,
    pub meta: RequestMeta,
    pub source: String,
}

/// Non-anonymous supporter shown on a campaign page.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PublicDonor {
    pub display_name: Option<String>,
    pub amount: Decimal,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, sqlx::FromRow)]
pub struct DonationTotals {
    pub count: i64,
    pub total: Decimal,
}

impl Donation {
    /// Refund requests are accepted while the donation is this young.
    pub fn within_refund_window(&self, window_days: i64, now: DateTime<Utc>) -> bool {
        now - self.created_at <= chrono::Duration::days(window_days)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn find_by_id_optional(id: DonationId, pool: &PgPool) -> Result<Option<Self>> {
        let donation = sqlx::query_as::<_, Self>("SELECT * FROM donations WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(donation)
    }

    pub async fn lock(id: DonationId, conn: &mut PgConnection) -> Result<Option<Self>> {
        let donation =
            sqlx::query_as::<_, Self>("SELECT * FROM donations WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(conn)
                .await?;
        Ok(donation)
    }

    pub async fn find_for_donor(
        donor_id: UserId,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let donations = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM donations
            WHERE donor_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(donor_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(donations)
    }

    pub async fn count_for_donor(donor_id: UserId, pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM donations WHERE donor_id = $1")
            .bind(donor_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    pub async fn find_public_donors(
        campaign_id: CampaignId,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<PublicDonor>> {
        let donors = sqlx::query_as::<_, PublicDonor>(
            r#"
            SELECT donor_display_name AS display_name, amount, donor_message AS message, created_at
            FROM donations
            WHERE campaign_id = $1 AND status = 'COMPLETED' AND is_anonymous = false
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(campaign_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(donors)
    }

    pub async fn count_public_donors(campaign_id: CampaignId, pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM donations
            WHERE campaign_id = $1 AND status = 'COMPLETED' AND is_anonymous = false
            "#,
        )
        .bind(campaign_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn find_for_campaign(
        campaign_id: CampaignId,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let donations = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM donations
            WHERE campaign_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(campaign_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(donations)
    }

    pub async fn count_for_campaign(campaign_id: CampaignId, pool: &PgPool) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM donations WHERE campaign_id = $1")
                .bind(campaign_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    pub async fn find_for_organization(
        organization_id: OrganizationId,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let donations = sqlx::query_as::<_, Self>(
            r#"
            SELECT d.* FROM donations d
            JOIN campaigns c ON c.id = d.campaign_id
            WHERE c.organization_id = $1
            ORDER BY d.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(organization_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(donations)
    }

    pub async fn count_for_organization(
        organization_id: OrganizationId,
        pool: &PgPool,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM donations d
            JOIN campaigns c ON c.id = d.campaign_id
            WHERE c.organization_id = $1
            "#,
        )
        .bind(organization_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn find_filtered(
        status: Option<DonationStatus>,
        refund_status: Option<RefundStatus>,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let donations = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM donations
            WHERE ($1::donation_status IS NULL OR status = $1)
              AND ($2::refund_status IS NULL OR refund_status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(status)
        .bind(refund_status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(donations)
    }

    pub async fn count_filtered(
        status: Option<DonationStatus>,
        refund_status: Option<RefundStatus>,
        pool: &PgPool,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM donations
            WHERE ($1::donation_status IS NULL OR status = $1)
              AND ($2::refund_status IS NULL OR refund_status = $2)
            "#,
        )
        .bind(status)
        .bind(refund_status)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Count and sum of completed donations, optionally since a point in time.
    pub async fn completed_totals(
        since: Option<DateTime<Utc>>,
        pool: &PgPool,
    ) -> Result<DonationTotals> {
        let totals = sqlx::query_as::<_, DonationTotals>(
            r#"
            SELECT COUNT(*) AS count, COALESCE(SUM(amount), 0) AS total
            FROM donations
            WHERE status = 'COMPLETED'
              AND ($1::timestamptz IS NULL OR created_at >= $1)
            "#,
        )
        .bind(since)
        .fetch_one(pool)
        .await?;
        Ok(totals)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub async fn insert(
        new: &NewDonation,
        status: DonationStatus,
        transaction_id: Option<&str>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let donation = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO donations (
                campaign_id, donor_id, amount, currency, status, payment_method,
                transaction_id, is_anonymous, donor_message, donor_display_name,
                guest_email, ip_address, user_agent, source
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(new.campaign_id)
        .bind(new.donor_id)
        .bind(new.amount)
        .bind(&new.currency)
        .bind(status)
        .bind(new.payment_method)
        .bind(transaction_id)
        .bind(new.is_anonymous)
        .bind(&new.donor_message)
        .bind(&new.donor_display_name)
        .bind(&new.guest_email)
        .bind(&new.meta.ip_address)
        .bind(&new.meta.user_agent)
        .bind(&new.source)
        .fetch_one(conn)
        .await?;
        Ok(donation)
    }

    /// PENDING -> COMPLETED. `None` when the donation already left PENDING.
    pub async fn mark_completed(
        id: DonationId,
        transaction_id: &str,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let donation = sqlx::query_as::<_, Self>(
            r#"
            UPDATE donations SET status = 'COMPLETED', transaction_id = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(transaction_id)
        .fetch_optional(conn)
        .await?;
        Ok(donation)
    }

    pub async fn mark_failed(id: DonationId, reason: &str, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE donations SET status = 'FAILED', failure_reason = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(id)
        .bind(reason)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// none -> requested on a completed donation.
    pub async fn request_refund(id: DonationId, reason: &str, pool: &PgPool) -> Result<Option<Self>> {
        let donation = sqlx::query_as::<_, Self>(
            r#"
            UPDATE donations SET
                refund_status = 'requested',
                refund_reason = $2,
                refund_requested_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'COMPLETED' AND refund_status = 'none'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .fetch_optional(pool)
        .await?;
        Ok(donation)
    }

    /// requested -> approved, donation REFUNDED.
    pub async fn approve_refund(
        id: DonationId,
        admin_id: UserId,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let donation = sqlx::query_as::<_, Self>(
            r#"
            UPDATE donations SET
                status = 'REFUNDED',
                refund_status = 'approved',
                refund_processed_at = NOW(),
                refund_processed_by = $2,
                updated_at = NOW()
            WHERE id = $1 AND status = 'COMPLETED' AND refund_status = 'requested'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(admin_id)
        .fetch_optional(conn)
        .await?;
        Ok(donation)
    }

    pub async fn reject_refund(
        id: DonationId,
        admin_id: UserId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let donation = sqlx::query_as::<_, Self>(
            r#"
            UPDATE donations SET
                refund_status = 'rejected',
                refund_processed_at = NOW(),
                refund_processed_by = $2,
                updated_at = NOW()
            WHERE id = $1 AND refund_status = 'requested'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(admin_id)
        .fetch_optional(pool)
        .await?;
        Ok(donation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn donation(created_at: DateTime<Utc>) -> Donation {
        Donation {
            id: DonationId::new(),
            campaign_id: CampaignId::new(),
            donor_id: Some(UserId::new()),
            amount: Decimal::from(100),
            currency: "TRY".to_string(),
            status: DonationStatus::Completed,
            payment_method: PaymentMethod::CreditCard,
            transaction_id: Some("SIM-1".to_string()),
            failure_reason: None,
            is_anonymous: false,
            donor_message: None,
            donor_display_name: None,
            guest_email: None,
            ip_address: Some("10.0.0.1".to_string()),
            user_agent: None,
            source: "web".to_string(),
            refund_status: RefundStatus::None,
            refund_reason: None,
            refund_requested_at: None,
            refund_processed_at: None,
            refund_processed_by: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn refund_window_is_inclusive_of_the_last_day() {
        let now = Utc::now();
        assert!(donation(now - Duration::days(14)).within_refund_window(14, now));
        assert!(!donation(now - Duration::days(15)).within_refund_window(14, now));
    }

    #[test]
    fn request_metadata_is_not_serialized() {
        let json = serde_json::to_value(donation(Utc::now())).unwrap();
        assert!(json.get("ip_address").is_none());
        assert_eq!(json["refund_status"], "none");
        assert_eq!(json["payment_method"], "CREDIT_CARD");
    }
}
