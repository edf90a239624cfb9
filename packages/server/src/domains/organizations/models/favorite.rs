use anyhow::Result;
use sqlx::PgPool;

use super::Organization;
use crate::common::{OrganizationId, UserId};

/// Donor bookmarks on organizations
pub struct FavoriteOrganization;

impl FavoriteOrganization {
    /// Idempotent.
    pub async fn add(user_id: UserId, organization_id: OrganizationId, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO favorite_organizations (user_id, organization_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn remove(user_id: UserId, organization_id: OrganizationId, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM favorite_organizations WHERE user_id = $1 AND organization_id = $2")
            .bind(user_id)
            .bind(organization_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn is_favorite(user_id: UserId, organization_id: OrganizationId, pool: &PgPool) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM favorite_organizations WHERE user_id = $1 AND organization_id = $2)",
        )
        .bind(user_id)
        .bind(organization_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// Favorited organizations, most recently added first.
    pub async fn organizations_for_user(
        user_id: UserId,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Organization>> {
        let orgs = sqlx::query_as::<_, Organization>(
            r#"
            SELECT o.* FROM organizations o
            JOIN favorite_organizations f ON f.organization_id = o.id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(orgs)
    }

    pub async fn count_for_user(user_id: UserId, pool: &PgPool) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM favorite_organizations WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
