use anyhow::Result;
use sqlx::PgPool;

use crate::common::{CampaignId, UserId};

/// Users who asked to hear about a campaign's progress
pub struct CampaignFollower;

/// Follower notifications a user can switch off in their preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowerTopic {
    Update,
    Completion,
}

impl CampaignFollower {
    /// Idempotent.
    pub async fn follow(user_id: UserId, campaign_id: CampaignId, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "INSERT INTO campaign_followers (user_id, campaign_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(campaign_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn unfollow(user_id: UserId, campaign_id: CampaignId, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM campaign_followers WHERE user_id = $1 AND campaign_id = $2")
            .bind(user_id)
            .bind(campaign_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn is_following(user_id: UserId, campaign_id: CampaignId, pool: &PgPool) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM campaign_followers WHERE user_id = $1 AND campaign_id = $2)",
        )
        .bind(user_id)
        .bind(campaign_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// Followers who have not opted out of `topic`. No preference row
    /// means opted in.
    pub async fn subscribed_ids(
        campaign_id: CampaignId,
        topic: FollowerTopic,
        pool: &PgPool,
    ) -> Result<Vec<UserId>> {
        let ids: Vec<UserId> = sqlx::query_scalar(
            r#"
            SELECT f.user_id FROM campaign_followers f
            LEFT JOIN user_preferences p ON p.user_id = f.user_id
            WHERE f.campaign_id = $1
              AND CASE $2
                    WHEN 'update' THEN COALESCE(p.notify_on_campaign_update, true)
                    ELSE COALESCE(p.notify_on_campaign_complete, true)
                  END
            "#,
        )
        .bind(campaign_id)
        .bind(match topic {
            FollowerTopic::Update => "update",
            FollowerTopic::Completion => "completion",
        })
        .fetch_all(pool)
        .await?;
        Ok(ids)
    }

    pub async fn count_for_campaign(campaign_id: CampaignId, pool: &PgPool) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM campaign_followers WHERE campaign_id = $1")
                .bind(campaign_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    pub async fn count_for_user(user_id: UserId, pool: &PgPool) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM campaign_followers WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
