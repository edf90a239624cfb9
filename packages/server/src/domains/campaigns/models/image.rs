use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{CampaignId, CampaignImageId};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CampaignImage {
    pub id: CampaignImageId,
    pub campaign_id: CampaignId,
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub caption: Option<String>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCampaignImage {
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub caption: Option<String>,
    pub display_order: Option<i32>,
}

impl CampaignImage {
    pub async fn find_for_campaign(campaign_id: CampaignId, pool: &PgPool) -> Result<Vec<Self>> {
        let images = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM campaign_images
            WHERE campaign_id = $1
            ORDER BY display_order ASC, created_at ASC
            "#,
        )
        .bind(campaign_id)
        .fetch_all(pool)
        .await?;
        Ok(images)
    }

    pub async fn ids_for_campaign(
        campaign_id: CampaignId,
        conn: &mut PgConnection,
    ) -> Result<Vec<CampaignImageId>> {
        let ids: Vec<CampaignImageId> = sqlx::query_scalar(
            "SELECT id FROM campaign_images WHERE campaign_id = $1",
        )
        .bind(campaign_id)
        .fetch_all(conn)
        .await?;
        Ok(ids)
    }

    /// Without an explicit position the image goes last.
    pub async fn create(
        campaign_id: CampaignId,
        new: &NewCampaignImage,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let image = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO campaign_images (campaign_id, image_url, thumbnail_url, caption, display_order)
            VALUES ($1, $2, $3, $4, COALESCE($5,
                (SELECT COALESCE(MAX(display_order) + 1, 0) FROM campaign_images WHERE campaign_id = $1)))
            RETURNING *
            "#,
        )
        .bind(campaign_id)
        .bind(&new.image_url)
        .bind(&new.thumbnail_url)
        .bind(&new.caption)
        .bind(new.display_order)
        .fetch_one(conn)
        .await?;
        Ok(image)
    }

    pub async fn delete(id: CampaignImageId, campaign_id: CampaignId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM campaign_images WHERE id = $1 AND campaign_id = $2")
            .bind(id)
            .bind(campaign_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// `ordered[i]` gets position `i`.
    pub async fn reorder(
        campaign_id: CampaignId,
        ordered: &[CampaignImageId],
        conn: &mut PgConnection,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE campaign_images ci
            SET display_order = (o.position - 1)::int
            FROM UNNEST($2::uuid[]) WITH ORDINALITY AS o(id, position)
            WHERE ci.id = o.id AND ci.campaign_id = $1
            "#,
        )
        .bind(campaign_id)
        .bind(ordered)
        .execute(conn)
        .await?;
        Ok(())
    }
}
