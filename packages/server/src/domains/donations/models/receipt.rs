use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use crate::common::utils::receipt_number;
use crate::common::{DonationId, ReceiptId};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DonationReceipt {
    pub id: ReceiptId,
    pub donation_id: DonationId,
    pub receipt_number: String,
    pub amount: Decimal,
    pub currency: String,
    pub campaign_title: String,
    pub organization_name: String,
    pub donor_name: String,
    pub issued_at: DateTime<Utc>,
}

/// Snapshot printed on a receipt.
#[derive(Debug, Clone)]
pub struct ReceiptDetails {
    pub donation_id: DonationId,
    pub amount: Decimal,
    pub currency: String,
    pub campaign_title: String,
    pub organization_name: String,
    pub donor_name: String,
}

impl DonationReceipt {
    /// Next value of the per-year counter. The upsert takes a row lock, so
    /// concurrent transactions get distinct numbers.
    pub async fn next_sequence(year: i32, conn: &mut PgConnection) -> Result<i64> {
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO receipt_sequences (year, last_value) VALUES ($1, 1)
            ON CONFLICT (year) DO UPDATE SET last_value = receipt_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(year)
        .fetch_one(conn)
        .await?;
        Ok(value)
    }

    pub async fn issue(details: ReceiptDetails, conn: &mut PgConnection) -> Result<Self> {
        let year = Utc::now().year();
        let sequence = Self::next_sequence(year, &mut *conn).await?;
        let number = receipt_number::format(year, sequence);

        let receipt = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO donation_receipts (
                donation_id, receipt_number, amount, currency,
                campaign_title, organization_name, donor_name
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(details.donation_id)
        .bind(&number)
        .bind(details.amount)
        .bind(&details.currency)
        .bind(&details.campaign_title)
        .bind(&details.organization_name)
        .bind(&details.donor_name)
        .fetch_one(conn)
        .await?;
        Ok(receipt)
    }

    pub async fn find_by_donation(donation_id: DonationId, pool: &PgPool) -> Result<Option<Self>> {
        let receipt =
            sqlx::query_as::<_, Self>("SELECT * FROM donation_receipts WHERE donation_id = $1")
                .bind(donation_id)
                .fetch_optional(pool)
                .await?;
        Ok(receipt)
    }

    pub async fn find_by_number(number: &str, pool: &PgPool) -> Result<Option<Self>> {
        let receipt =
            sqlx::query_as::<_, Self>("SELECT * FROM donation_receipts WHERE receipt_number = $1")
                .bind(number)
                .fetch_optional(pool)
                .await?;
        Ok(receipt)
    }
}
