use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{CampaignId, CategoryId};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Category as attached to one campaign
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CampaignCategory {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub icon: Option<String>,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl Category {
    pub async fn find_active(pool: &PgPool) -> Result<Vec<Self>> {
        let categories = sqlx::query_as::<_, Self>(
            "SELECT * FROM categories WHERE is_active = true ORDER BY display_order ASC, name ASC",
        )
        .fetch_all(pool)
        .await?;
        Ok(categories)
    }

    pub async fn find_by_id_optional(id: CategoryId, pool: &PgPool) -> Result<Option<Self>> {
        let category = sqlx::query_as::<_, Self>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(category)
    }

    pub async fn slug_taken(slug: &str, except: Option<CategoryId>, pool: &PgPool) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(except)
        .fetch_one(pool)
        .await?;
        Ok(taken)
    }

    /// Number of the given ids that exist and are active.
    pub async fn count_active_among(ids: &[CategoryId], pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM categories WHERE id = ANY($1) AND is_active = true",
        )
        .bind(ids)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn create(
        name: &str,
        slug: &str,
        description: Option<&str>,
        icon: Option<&str>,
        display_order: i32,
        pool: &PgPool,
    ) -> Result<Self> {
        let category = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO categories (name, slug, description, icon, display_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(icon)
        .bind(display_order)
        .fetch_one(pool)
        .await?;
        Ok(category)
    }

    pub async fn update(id: CategoryId, changes: CategoryChanges, pool: &PgPool) -> Result<Self> {
        let category = sqlx::query_as::<_, Self>(
            r#"
            UPDATE categories SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                icon = COALESCE($5, icon),
                display_order = COALESCE($6, display_order),
                is_active = COALESCE($7, is_active)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.slug)
        .bind(&changes.description)
        .bind(&changes.icon)
        .bind(changes.display_order)
        .bind(changes.is_active)
        .fetch_one(pool)
        .await?;
        Ok(category)
    }

    pub async fn deactivate(id: CategoryId, pool: &PgPool) -> Result<Option<Self>> {
        let category = sqlx::query_as::<_, Self>(
            "UPDATE categories SET is_active = false WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(category)
    }

    /// Replaces the campaign's category links.
    pub async fn link_to_campaign(
        campaign_id: CampaignId,
        category_ids: &[CategoryId],
        primary: Option<CategoryId>,
        conn: &mut PgConnection,
    ) -> Result<()> {
        sqlx::query("DELETE FROM campaign_categories WHERE campaign_id = $1")
            .bind(campaign_id)
            .execute(&mut *conn)
            .await?;

        for category_id in category_ids {
            sqlx::query(
                r#"
                INSERT INTO campaign_categories (campaign_id, category_id, is_primary)
                VALUES ($1, $2, $3)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(campaign_id)
            .bind(category_id)
            .bind(primary == Some(*category_id))
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn for_campaign(campaign_id: CampaignId, pool: &PgPool) -> Result<Vec<CampaignCategory>> {
        let categories = sqlx::query_as::<_, CampaignCategory>(
            r#"
            SELECT c.id, c.name, c.slug, c.icon, cc.is_primary
            FROM campaign_categories cc
            JOIN categories c ON c.id = cc.category_id
            WHERE cc.campaign_id = $1
            ORDER BY cc.is_primary DESC, c.display_order ASC
            "#,
        )
        .bind(campaign_id)
        .fetch_all(pool)
        .await?;
        Ok(categories)
    }
}
