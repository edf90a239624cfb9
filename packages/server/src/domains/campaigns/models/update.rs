use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{CampaignId, CampaignUpdateId, UserId};

/// Progress post from the organization to donors and followers
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CampaignUpdate {
    pub id: CampaignUpdateId,
    pub campaign_id: CampaignId,
    pub author_id: UserId,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCampaignUpdate {
    pub campaign_id: CampaignId,
    pub author_id: UserId,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
}

impl CampaignUpdate {
    pub async fn find_by_id_optional(id: CampaignUpdateId, pool: &PgPool) -> Result<Option<Self>> {
        let update = sqlx::query_as::<_, Self>("SELECT * FROM campaign_updates WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(update)
    }

    pub async fn find_for_campaign(
        campaign_id: CampaignId,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let updates = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM campaign_updates
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
        Ok(updates)
    }

    pub async fn count_for_campaign(campaign_id: CampaignId, pool: &PgPool) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM campaign_updates WHERE campaign_id = $1")
                .bind(campaign_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    pub async fn create(new: NewCampaignUpdate, pool: &PgPool) -> Result<Self> {
        let update = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO campaign_updates (campaign_id, author_id, title, content, image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.campaign_id)
        .bind(new.author_id)
        .bind(&new.title)
        .bind(&new.content)
        .bind(&new.image_url)
        .fetch_one(pool)
        .await?;
        Ok(update)
    }

    pub async fn delete(id: CampaignUpdateId, campaign_id: CampaignId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM campaign_updates WHERE id = $1 AND campaign_id = $2")
            .bind(id)
            .bind(campaign_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
