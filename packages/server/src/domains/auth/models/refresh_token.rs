use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::common::{RequestMeta, UserId};

/// Issued refresh token, stored by SHA-256 hash only.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: UserId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub async fn create(
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        meta: &RequestMeta,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let token = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .bind(&meta.ip_address)
        .bind(&meta.user_agent)
        .fetch_one(conn)
        .await?;
        Ok(token)
    }

    pub async fn find_by_hash(token_hash: &str, pool: &PgPool) -> Result<Option<Self>> {
        let token =
            sqlx::query_as::<_, Self>("SELECT * FROM refresh_tokens WHERE token_hash = $1")
                .bind(token_hash)
                .fetch_optional(pool)
                .await?;
        Ok(token)
    }

    /// Returns false when the token was already revoked (lost a rotation race).
    pub async fn revoke(id: Uuid, conn: &mut PgConnection) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn revoke_by_hash(token_hash: &str, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(token_hash)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn revoke_all_for_user(user_id: UserId, conn: &mut PgConnection) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Drops tokens that expired or were revoked before `cutoff`.
    pub async fn delete_stale(cutoff: DateTime<Utc>, pool: &PgPool) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM refresh_tokens WHERE expires_at < $1 OR revoked_at < $1",
        )
        .bind(cutoff)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
