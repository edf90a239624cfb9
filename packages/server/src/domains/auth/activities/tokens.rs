//! Token issuing, refresh rotation and logout

use anyhow::Result;
use chrono::Utc;
use sqlx::PgConnection;
use tracing::{info, warn};

use crate::common::utils::hash_token;
use crate::common::{ApiError, RequestMeta};
use crate::domains::auth::data::{AuthTokens, UserData};
use crate::domains::auth::models::{RefreshToken, User, UserProfile};
use crate::kernel::ServerDeps;

pub(crate) fn invalid_credentials() -> anyhow::Error {
    ApiError::Unauthorized("Invalid email or password".to_string()).into()
}

fn invalid_refresh_token() -> anyhow::Error {
    ApiError::Unauthorized("Invalid or expired refresh token".to_string()).into()
}

/// Signs a new access/refresh pair and stores the refresh token's hash.
pub(crate) async fn issue_tokens(
    user: User,
    profile: Option<UserProfile>,
    meta: &RequestMeta,
    conn: &mut PgConnection,
    deps: &ServerDeps,
) -> Result<AuthTokens> {
    let policy = deps.token_policy;
    let access_token = deps.jwt_service.create_access_token(
        user.id,
        &user.email,
        user.role,
        policy.access_token_ttl,
    )?;
    let refresh_token = deps.jwt_service.create_refresh_token(
        user.id,
        &user.email,
        user.role,
        policy.refresh_token_ttl,
    )?;

    RefreshToken::create(
        user.id,
        &hash_token(&refresh_token),
        Utc::now() + policy.refresh_token_ttl,
        meta,
        conn,
    )
    .await?;

    Ok(AuthTokens {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: policy.access_token_ttl.num_seconds(),
        user: UserData::new(user, profile),
    })
}

/// Rotates a refresh token. Presenting a token that was already rotated or
/// revoked is treated as theft and revokes every session of that user.
pub async fn refresh(
    refresh_token: &str,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<AuthTokens> {
    let claims = deps
        .jwt_service
        .verify_refresh_token(refresh_token)
        .map_err(|_| invalid_refresh_token())?;

    let stored = RefreshToken::find_by_hash(&hash_token(refresh_token), &deps.db_pool)
        .await?
        .ok_or_else(invalid_refresh_token)?;

    if stored.user_id != claims.user_id() {
        return Err(invalid_refresh_token());
    }

    if stored.is_revoked() {
        let mut conn = deps.db_pool.acquire().await?;
        let revoked = RefreshToken::revoke_all_for_user(stored.user_id, &mut conn).await?;
        warn!(
            user_id = %stored.user_id,
            revoked_sessions = revoked,
            "Revoked refresh token reused, all sessions revoked"
        );
        return Err(invalid_refresh_token());
    }

    if stored.is_expired_at(Utc::now()) {
        return Err(invalid_refresh_token());
    }

    let user = User::find_by_id(stored.user_id, &deps.db_pool).await?;
    if user.status.blocks_login() {
        return Err(invalid_refresh_token());
    }
    let profile = UserProfile::find_by_user(user.id, &deps.db_pool).await?;

    let mut tx = deps.db_pool.begin().await?;
    if !RefreshToken::revoke(stored.id, &mut tx).await? {
        // Another request rotated this token between our read and now.
        RefreshToken::revoke_all_for_user(user.id, &mut tx).await?;
        tx.commit().await?;
        warn!(user_id = %user.id, "Concurrent refresh token reuse, all sessions revoked");
        return Err(invalid_refresh_token());
    }
    let user_id = user.id;
    let tokens = issue_tokens(user, profile, meta, &mut tx, deps).await?;
    tx.commit().await?;

    info!(user_id = %user_id, "Refresh token rotated");
    Ok(tokens)
}

/// Idempotent: unknown or already revoked tokens are ignored.
pub async fn logout(refresh_token: &str, deps: &ServerDeps) -> Result<()> {
    RefreshToken::revoke_by_hash(&hash_token(refresh_token), &deps.db_pool).await?;
    info!("Refresh token revoked on logout");
    Ok(())
}
