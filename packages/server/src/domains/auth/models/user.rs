use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{UserId, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
    PendingVerification,
}

impl UserStatus {
    /// Accounts in these states cannot sign in.
    pub fn blocks_login(&self) -> bool {
        matches!(self, UserStatus::Suspended | UserStatus::Inactive)
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "ACTIVE"),
            UserStatus::Inactive => write!(f, "INACTIVE"),
            UserStatus::Suspended => write!(f, "SUSPENDED"),
            UserStatus::PendingVerification => write!(f, "PENDING_VERIFICATION"),
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ACTIVE" => Ok(UserStatus::Active),
            "INACTIVE" => Ok(UserStatus::Inactive),
            "SUSPENDED" => Ok(UserStatus::Suspended),
            "PENDING_VERIFICATION" => Ok(UserStatus::PendingVerification),
            _ => Err(anyhow::anyhow!("Invalid user status: {}", s)),
        }
    }
}

/// Platform account. `password_hash` never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub email_verified: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filters for the admin user list
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

impl User {
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.map_or(false, |until| until > now)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn find_by_id(id: UserId, pool: &PgPool) -> Result<Self> {
        let user = sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id_optional(id: UserId, pool: &PgPool) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    /// `email` must already be normalized (lowercase).
    pub async fn find_by_email(email: &str, pool: &PgPool) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, Self>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn email_exists(email: &str, pool: &PgPool) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }

    pub async fn find_filtered(
        filter: &UserFilter,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let users = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM users
            WHERE ($1::text IS NULL OR email ILIKE '%' || $1 || '%')
              AND ($2::user_role IS NULL OR role = $2)
              AND ($3::user_status IS NULL OR status = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(&filter.email)
        .bind(filter.role)
        .bind(filter.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(users)
    }

    pub async fn count_filtered(filter: &UserFilter, pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE ($1::text IS NULL OR email ILIKE '%' || $1 || '%')
              AND ($2::user_role IS NULL OR role = $2)
              AND ($3::user_status IS NULL OR status = $3)
            "#,
        )
        .bind(&filter.email)
        .bind(filter.role)
        .bind(filter.status)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn count_grouped_by_role(pool: &PgPool) -> Result<Vec<(UserRole, i64)>> {
        let rows = sqlx::query_as::<_, (UserRole, i64)>(
            "SELECT role, COUNT(*) FROM users GROUP BY role",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub async fn create(
        email: &str,
        password_hash: &str,
        role: UserRole,
        status: UserStatus,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO users (id, email, password_hash, role, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(UserId::new())
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(status)
        .fetch_one(conn)
        .await?;
        Ok(user)
    }

    /// Counts a failed sign-in. Reaching `max_attempts` locks the account for
    /// `lock_minutes` and starts the counter over.
    pub async fn record_failed_login(
        id: UserId,
        max_attempts: i32,
        lock_minutes: i32,
        pool: &PgPool,
    ) -> Result<Self> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            UPDATE users SET
                locked_until = CASE
                    WHEN failed_login_attempts + 1 >= $2 THEN NOW() + make_interval(mins => $3)
                    ELSE locked_until
                END,
                failed_login_attempts = CASE
                    WHEN failed_login_attempts + 1 >= $2 THEN 0
                    ELSE failed_login_attempts + 1
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(max_attempts)
        .bind(lock_minutes)
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    pub async fn record_successful_login(id: UserId, pool: &PgPool) -> Result<Self> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            UPDATE users SET
                failed_login_attempts = 0,
                locked_until = NULL,
                last_login_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    pub async fn update_password(
        id: UserId,
        password_hash: &str,
        conn: &mut PgConnection,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                password_hash = $2,
                password_changed_at = NOW(),
                failed_login_attempts = 0,
                locked_until = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Verifying the address also activates a pending account.
    pub async fn mark_email_verified(id: UserId, conn: &mut PgConnection) -> Result<Self> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            UPDATE users SET
                email_verified = true,
                email_verified_at = COALESCE(email_verified_at, NOW()),
                status = CASE WHEN status = 'PENDING_VERIFICATION' THEN 'ACTIVE'::user_status ELSE status END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(conn)
        .await?;
        Ok(user)
    }

    pub async fn set_status(id: UserId, status: UserStatus, pool: &PgPool) -> Result<Self> {
        let user = sqlx::query_as::<_, Self>(
            "UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    pub async fn set_role(id: UserId, role: UserRole, pool: &PgPool) -> Result<Self> {
        let user = sqlx::query_as::<_, Self>(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(role)
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    pub async fn unlock(id: UserId, pool: &PgPool) -> Result<Self> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            UPDATE users SET failed_login_attempts = 0, locked_until = NULL, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(locked_until: Option<DateTime<Utc>>) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            email: "ayse@example.com".to_string(),
            password_hash: String::new(),
            role: UserRole::Donor,
            status: UserStatus::Active,
            email_verified: true,
            email_verified_at: None,
            failed_login_attempts: 0,
            locked_until,
            last_login_at: None,
            password_changed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn lock_only_applies_until_it_expires() {
        let now = Utc::now();
        assert!(!user(None).is_locked_at(now));
        assert!(user(Some(now + Duration::minutes(5))).is_locked_at(now));
        assert!(!user(Some(now - Duration::seconds(1))).is_locked_at(now));
    }

    #[test]
    fn suspended_and_inactive_accounts_cannot_log_in() {
        assert!(UserStatus::Suspended.blocks_login());
        assert!(UserStatus::Inactive.blocks_login());
        assert!(!UserStatus::Active.blocks_login());
        assert!(!UserStatus::PendingVerification.blocks_login());
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let mut u = user(None);
        u.password_hash = "$argon2id$secret".to_string();
        let json = serde_json::to_value(&u).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["status"], "ACTIVE");
    }

    #[test]
    fn status_parses_from_query_strings() {
        assert_eq!(
            "PENDING_VERIFICATION".parse::<UserStatus>().unwrap(),
            UserStatus::PendingVerification
        );
        assert!("active".parse::<UserStatus>().is_err());
    }
}
