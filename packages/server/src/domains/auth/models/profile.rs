use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::UserId;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub city: Option<String>,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub async fn find_by_user(user_id: UserId, pool: &PgPool) -> Result<Option<Self>> {
        let profile =
            sqlx::query_as::<_, Self>("SELECT * FROM user_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;
        Ok(profile)
    }

    pub async fn create(
        user_id: UserId,
        first_name: &str,
        last_name: &str,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let profile = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO user_profiles (user_id, first_name, last_name)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(conn)
        .await?;
        Ok(profile)
    }

    pub async fn update(user_id: UserId, input: UpdateProfile, pool: &PgPool) -> Result<Self> {
        let profile = sqlx::query_as::<_, Self>(
            r#"
            UPDATE user_profiles SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                avatar_url = COALESCE($5, avatar_url),
                bio = COALESCE($6, bio),
                city = COALESCE($7, city),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.phone)
        .bind(&input.avatar_url)
        .bind(&input.bio)
        .bind(&input.city)
        .fetch_one(pool)
        .await?;
        Ok(profile)
    }
}
