use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::DonationTypeId;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DonationType {
    pub id: DonationTypeId,
    pub type_code: String,
    pub name: String,
    pub name_en: Option<String>,
    pub description: Option<String>,
    pub rules: Option<String>,
    pub minimum_amount: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl DonationType {
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let types = sqlx::query_as::<_, Self>("SELECT * FROM donation_types ORDER BY name ASC")
            .fetch_all(pool)
            .await?;
        Ok(types)
    }

    pub async fn find_active(pool: &PgPool) -> Result<Vec<Self>> {
        let types = sqlx::query_as::<_, Self>(
            "SELECT * FROM donation_types WHERE is_active = true ORDER BY name ASC",
        )
        .fetch_all(pool)
        .await?;
        Ok(types)
    }

    pub async fn find_by_code(code: &str, pool: &PgPool) -> Result<Option<Self>> {
        let donation_type =
            sqlx::query_as::<_, Self>("SELECT * FROM donation_types WHERE type_code = $1")
                .bind(code)
                .fetch_optional(pool)
                .await?;
        Ok(donation_type)
    }
}
