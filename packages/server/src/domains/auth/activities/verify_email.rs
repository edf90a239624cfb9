use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info};

use crate::common::utils::{generate_token, hash_token};
use crate::common::{ApiError, AuthUser};
use crate::domains::auth::data::UserData;
use crate::domains::auth::models::{OneTimeToken, OneTimeTokenKind, User, UserProfile};
use crate::kernel::ServerDeps;

/// Consume a verification token; a pending account becomes ACTIVE.
pub async fn verify_email(token: &str, deps: &ServerDeps) -> Result<UserData> {
    let invalid = || ApiError::bad_request("Invalid or expired token");
    let stored = OneTimeToken::find_by_hash(
        OneTimeTokenKind::EmailVerification,
        &hash_token(token),
        &deps.db_pool,
    )
    .await?
    .ok_or_else(invalid)?;
    if !stored.is_usable_at(Utc::now()) {
        return Err(invalid().into());
    }

    let mut tx = deps.db_pool.begin().await?;
    if !OneTimeToken::consume(OneTimeTokenKind::EmailVerification, stored.id, &mut tx).await? {
        return Err(invalid().into());
    }
    let user = User::mark_email_verified(stored.user_id, &mut tx).await?;
    tx.commit().await?;

    info!(user_id = %user.id, "E-mail verified");
    let profile = UserProfile::find_by_user(user.id, &deps.db_pool).await?;
    Ok(UserData::new(user, profile))
}

/// Issue a fresh verification token, voiding earlier ones.
pub async fn resend_verification(user: &AuthUser, deps: &ServerDeps) -> Result<()> {
    let account = User::find_by_id(user.user_id, &deps.db_pool).await?;
    if account.email_verified {
        return Err(ApiError::bad_request("E-mail is already verified").into());
    }

    let token = generate_token();
    let mut tx = deps.db_pool.begin().await?;
    OneTimeToken::invalidate_for_user(OneTimeTokenKind::EmailVerification, account.id, &mut tx)
        .await?;
    OneTimeToken::create(
        OneTimeTokenKind::EmailVerification,
        account.id,
        &hash_token(&token),
        &mut tx,
    )
    .await?;
    tx.commit().await?;

    debug!(user_id = %account.id, token = %token, "E-mail verification token reissued");
    Ok(())
}
