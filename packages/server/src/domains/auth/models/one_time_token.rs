use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::common::UserId;

/// Single-use tokens mailed to the user. Both kinds share one table layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneTimeTokenKind {
    PasswordReset,
    EmailVerification,
}

impl OneTimeTokenKind {
    fn table(&self) -> &'static str {
        match self {
            OneTimeTokenKind::PasswordReset => "password_reset_tokens",
            OneTimeTokenKind::EmailVerification => "email_verification_tokens",
        }
    }

    pub fn lifetime(&self) -> Duration {
        match self {
            OneTimeTokenKind::PasswordReset => Duration::hours(1),
            OneTimeTokenKind::EmailVerification => Duration::hours(24),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OneTimeToken {
    pub id: Uuid,
    pub user_id: UserId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl OneTimeToken {
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && self.expires_at > now
    }

    pub async fn create(
        kind: OneTimeTokenKind,
        user_id: UserId,
        token_hash: &str,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let sql = format!(
            "INSERT INTO {} (user_id, token_hash, expires_at) VALUES ($1, $2, $3) RETURNING *",
            kind.table()
        );
        let token = sqlx::query_as::<_, Self>(&sql)
            .bind(user_id)
            .bind(token_hash)
            .bind(Utc::now() + kind.lifetime())
            .fetch_one(conn)
            .await?;
        Ok(token)
    }

    pub async fn find_by_hash(
        kind: OneTimeTokenKind,
        token_hash: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let sql = format!("SELECT * FROM {} WHERE token_hash = $1", kind.table());
        let token = sqlx::query_as::<_, Self>(&sql)
            .bind(token_hash)
            .fetch_optional(pool)
            .await?;
        Ok(token)
    }

    /// Returns false when another request consumed the token first.
    pub async fn consume(kind: OneTimeTokenKind, id: Uuid, conn: &mut PgConnection) -> Result<bool> {
        let sql = format!(
            "UPDATE {} SET used_at = NOW() WHERE id = $1 AND used_at IS NULL",
            kind.table()
        );
        let result = sqlx::query(&sql).bind(id).execute(conn).await?;
        Ok(result.rows_affected() == 1)
    }

    /// Voids every outstanding token of this kind for the user.
    pub async fn invalidate_for_user(
        kind: OneTimeTokenKind,
        user_id: UserId,
        conn: &mut PgConnection,
    ) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET used_at = NOW() WHERE user_id = $1 AND used_at IS NULL",
            kind.table()
        );
        sqlx::query(&sql).bind(user_id).execute(conn).await?;
        Ok(())
    }

    pub async fn delete_stale(
        kind: OneTimeTokenKind,
        cutoff: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE expires_at < $1 OR used_at < $1",
            kind.table()
        );
        let result = sqlx::query(&sql).bind(cutoff).execute(pool).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_tokens_live_one_hour_and_verification_a_day() {
        assert_eq!(OneTimeTokenKind::PasswordReset.lifetime(), Duration::hours(1));
        assert_eq!(OneTimeTokenKind::EmailVerification.lifetime(), Duration::hours(24));
    }

    #[test]
    fn used_or_expired_tokens_are_unusable() {
        let now = Utc::now();
        let token = OneTimeToken {
            id: Uuid::new_v4(),
            user_id: UserId::new(),
            token_hash: String::new(),
            expires_at: now + Duration::minutes(30),
            used_at: None,
            created_at: now,
        };
        assert!(token.is_usable_at(now));
        assert!(!token.is_usable_at(now + Duration::hours(1)));

        let used = OneTimeToken {
            used_at: Some(now),
            ..token
        };
        assert!(!used.is_usable_at(now));
    }
}
