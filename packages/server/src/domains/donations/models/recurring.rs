use anyhow::Result;
use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{CampaignId, OrganizationId, RecurringDonationId, UserId};

/// Consecutive charge failures before a plan is marked failed.
pub const MAX_CONSECUTIVE_FAILURES: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "recurring_frequency", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecurringFrequency {
    Weekly,
    Monthly,
    Yearly,
}

impl RecurringFrequency {
    pub fn next_date(&self, from: NaiveDate) -> NaiveDate {
        match self {
            RecurringFrequency::Weekly => from + Duration::weeks(1),
            RecurringFrequency::Monthly => from
                .checked_add_months(Months::new(1))
                .unwrap_or(from + Duration::days(30)),
            RecurringFrequency::Yearly => from
                .checked_add_months(Months::new(12))
                .unwrap_or(from + Duration::days(365)),
        }
    }

    /// Amount normalized to a month: weekly x4, yearly /12 (half-up, 2dp).
    pub fn monthly_equivalent(&self, amount: Decimal) -> Decimal {
        let monthly = match self {
            RecurringFrequency::Weekly => amount * Decimal::from(4),
            RecurringFrequency::Monthly => amount,
            RecurringFrequency::Yearly => amount / Decimal::from(12),
        };
        monthly.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "recurring_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecurringStatus {
    Active,
    Paused,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecurringDonation {
    pub id: RecurringDonationId,
    pub donor_id: UserId,
    pub campaign_id: Option<CampaignId>,
    pub organization_id: Option<OrganizationId>,
    pub amount: Decimal,
    pub currency: String,
    pub frequency: RecurringFrequency,
    pub status: RecurringStatus,
    pub next_payment_date: NaiveDate,
    pub last_payment_at: Option<DateTime<Utc>>,
    pub total_donated: Decimal,
    pub payment_count: i32,
    pub failure_count: i32,
    pub last_failure_reason: Option<String>,
    #[serde(skip_serializing)]
    pub card_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRecurringDonation {
    pub donor_id: UserId,
    pub campaign_id: Option<CampaignId>,
    pub organization_id: Option<OrganizationId>,
    pub amount: Decimal,
    pub currency: String,
    pub frequency: RecurringFrequency,
    pub next_payment_date: NaiveDate,
    pub card_token: String,
}

impl RecurringDonation {
    pub async fn find_by_id_optional(
        id: RecurringDonationId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let plan = sqlx::query_as::<_, Self>("SELECT * FROM recurring_donations WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(plan)
    }

    pub async fn find_for_donor(donor_id: UserId, pool: &PgPool) -> Result<Vec<Self>> {
        let plans = sqlx::query_as::<_, Self>(
            "SELECT * FROM recurring_donations WHERE donor_id = $1 ORDER BY created_at DESC",
        )
        .bind(donor_id)
        .fetch_all(pool)
        .await?;
        Ok(plans)
    }

    pub async fn find_due(today: NaiveDate, pool: &PgPool) -> Result<Vec<Self>> {
        let plans = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM recurring_donations
            WHERE status = 'active' AND next_payment_date <= $1
            ORDER BY next_payment_date ASC
            "#,
        )
        .bind(today)
        .fetch_all(pool)
        .await?;
        Ok(plans)
    }

    pub async fn create(new: NewRecurringDonation, pool: &PgPool) -> Result<Self> {
        let plan = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO recurring_donations (
                donor_id, campaign_id, organization_id, amount, currency,
                frequency, next_payment_date, card_token
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(new.donor_id)
        .bind(new.campaign_id)
        .bind(new.organization_id)
        .bind(new.amount)
        .bind(&new.currency)
        .bind(new.frequency)
        .bind(new.next_payment_date)
        .bind(&new.card_token)
        .fetch_one(pool)
        .await?;
        Ok(plan)
    }

    pub async fn update_terms(
        id: RecurringDonationId,
        amount: Decimal,
        frequency: RecurringFrequency,
        next_payment_date: NaiveDate,
        pool: &PgPool,
    ) -> Result<Self> {
        let plan = sqlx::query_as::<_, Self>(
            r#"
            UPDATE recurring_donations SET
                amount = $2,
                frequency = $3,
                next_payment_date = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(amount)
        .bind(frequency)
        .bind(next_payment_date)
        .fetch_one(pool)
        .await?;
        Ok(plan)
    }

    /// Moves `from` -> `to`. `None` when the plan was no longer in `from`.
    pub async fn transition(
        id: RecurringDonationId,
        from: RecurringStatus,
        to: RecurringStatus,
        next_payment_date: Option<NaiveDate>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let plan = sqlx::query_as::<_, Self>(
            r#"
            UPDATE recurring_donations SET
                status = $3,
                next_payment_date = COALESCE($4, next_payment_date),
                failure_count = CASE WHEN $3 = 'active'::recurring_status THEN 0 ELSE failure_count END,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(next_payment_date)
        .fetch_optional(pool)
        .await?;
        Ok(plan)
    }

    /// Moves the schedule of an active plan from `period` to `next`. `None`
    /// when another run already claimed the period or the plan left active.
    pub async fn claim_period(
        id: RecurringDonationId,
        period: NaiveDate,
        next: NaiveDate,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let plan = sqlx::query_as::<_, Self>(
            r#"
            UPDATE recurring_donations SET
                next_payment_date = $3,
                updated_at = NOW()
            WHERE id = $1 AND status = 'active' AND next_payment_date = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(period)
        .bind(next)
        .fetch_optional(pool)
        .await?;
        Ok(plan)
    }

    /// active -> cancelled when the target can no longer take donations.
    pub async fn stop(
        id: RecurringDonationId,
        reason: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let plan = sqlx::query_as::<_, Self>(
            r#"
            UPDATE recurring_donations SET
                status = 'cancelled',
                last_failure_reason = $2,
                updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .fetch_optional(pool)
        .await?;
        Ok(plan)
    }

    pub async fn record_success(
        id: RecurringDonationId,
        amount: Decimal,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let plan = sqlx::query_as::<_, Self>(
            r#"
            UPDATE recurring_donations SET
                total_donated = total_donated + $2,
                payment_count = payment_count + 1,
                failure_count = 0,
                last_failure_reason = NULL,
                last_payment_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(amount)
        .fetch_one(conn)
        .await?;
        Ok(plan)
    }

    /// Counts a failed charge and puts the schedule back on `retry_on`; the
    /// plan flips to failed on the last allowed one.
    pub async fn record_failure(
        id: RecurringDonationId,
        reason: &str,
        retry_on: NaiveDate,
        pool: &PgPool,
    ) -> Result<Self> {
        let plan = sqlx::query_as::<_, Self>(
            r#"
            UPDATE recurring_donations SET
                failure_count = failure_count + 1,
                last_failure_reason = $2,
                next_payment_date = $4,
                status = CASE WHEN failure_count + 1 >= $3 THEN 'failed'::recurring_status ELSE status END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .bind(MAX_CONSECUTIVE_FAILURES)
        .bind(retry_on)
        .fetch_one(pool)
        .await?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn next_date_follows_the_calendar() {
        assert_eq!(RecurringFrequency::Weekly.next_date(d(2026, 1, 28)), d(2026, 2, 4));
        assert_eq!(RecurringFrequency::Monthly.next_date(d(2026, 1, 31)), d(2026, 2, 28));
        assert_eq!(RecurringFrequency::Yearly.next_date(d(2028, 2, 29)), d(2029, 2, 28));
    }

    #[test]
    fn monthly_equivalent_rounds_half_up() {
        let amount = Decimal::from(100);
        assert_eq!(RecurringFrequency::Weekly.monthly_equivalent(amount), Decimal::from(400));
        assert_eq!(RecurringFrequency::Monthly.monthly_equivalent(amount), amount);
        assert_eq!(
            RecurringFrequency::Yearly.monthly_equivalent(amount),
            Decimal::from_str("8.33").unwrap()
        );
        assert_eq!(
            RecurringFrequency::Yearly.monthly_equivalent(Decimal::from_str("0.06").unwrap()),
            Decimal::from_str("0.01").unwrap()
        );
    }
}
