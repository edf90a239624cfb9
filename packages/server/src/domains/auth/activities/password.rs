//! Forgot / reset / change password

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info};

use crate::common::utils::{generate_token, hash_token};
use crate::common::validation::{email, password};
use crate::common::{ApiError, AuthUser, RequestMeta};
use crate::domains::audit::{self, AuditAction, AuditEntry};
use crate::domains::auth::data::{ChangePasswordInput, ResetPasswordInput};
use crate::domains::auth::models::{OneTimeToken, OneTimeTokenKind, RefreshToken, User};
use crate::domains::auth::password::{hash_password, verify_password};
use crate::kernel::ServerDeps;

pub(crate) fn validate_new_password(new_password: &str, confirm: &str) -> Result<(), ApiError> {
    password::validate(new_password).into_api_result("new_password")?;
    if new_password != confirm {
        return Err(ApiError::validation("new_password_confirm", "Passwords do not match"));
    }
    Ok(())
}

/// Always succeeds, whether or not the e-mail is registered.
pub async fn forgot_password(email_input: &str, deps: &ServerDeps) -> Result<()> {
    let email = email::normalize(email_input);
    let Some(user) = User::find_by_email(&email, &deps.db_pool).await? else {
        debug!("Password reset requested for unknown e-mail");
        return Ok(());
    };

    let token = generate_token();
    let mut tx = deps.db_pool.begin().await?;
    OneTimeToken::invalidate_for_user(OneTimeTokenKind::PasswordReset, user.id, &mut tx).await?;
    OneTimeToken::create(
        OneTimeTokenKind::PasswordReset,
        user.id,
        &hash_token(&token),
        &mut tx,
    )
    .await?;
    tx.commit().await?;

    debug!(user_id = %user.id, token = %token, "Password reset token issued");
    info!(user_id = %user.id, "Password reset requested");
    Ok(())
}

pub async fn reset_password(
    input: ResetPasswordInput,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<()> {
    validate_new_password(&input.new_password, &input.new_password_confirm)?;

    let invalid = || ApiError::bad_request("Invalid or expired token");
    let token = OneTimeToken::find_by_hash(
        OneTimeTokenKind::PasswordReset,
        &hash_token(&input.token),
        &deps.db_pool,
    )
    .await?
    .ok_or_else(invalid)?;
    if !token.is_usable_at(Utc::now()) {
        return Err(invalid().into());
    }

    let password_hash = hash_password(&input.new_password)?;

    let mut tx = deps.db_pool.begin().await?;
    if !OneTimeToken::consume(OneTimeTokenKind::PasswordReset, token.id, &mut tx).await? {
        return Err(invalid().into());
    }
    User::update_password(token.user_id, &password_hash, &mut tx).await?;
    let revoked = RefreshToken::revoke_all_for_user(token.user_id, &mut tx).await?;
    tx.commit().await?;

    info!(user_id = %token.user_id, revoked_sessions = revoked, "Password reset completed");
    audit::record(
        AuditEntry::builder()
            .user_id(token.user_id)
            .action(AuditAction::PasswordResetComplete)
            .entity_type("user")
            .entity_id(token.user_id.into_uuid())
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;
    Ok(())
}

pub async fn change_password(
    input: ChangePasswordInput,
    user: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<()> {
    validate_new_password(&input.new_password, &input.new_password_confirm)?;
    if input.new_password == input.current_password {
        return Err(ApiError::validation(
            "new_password",
            "New password must differ from the current password",
        )
        .into());
    }

    let account = User::find_by_id(user.user_id, &deps.db_pool).await?;
    if !verify_password(&input.current_password, &account.password_hash) {
        return Err(
            ApiError::validation("current_password", "Current password is incorrect").into(),
        );
    }

    let password_hash = hash_password(&input.new_password)?;
    let mut tx = deps.db_pool.begin().await?;
    User::update_password(account.id, &password_hash, &mut tx).await?;
    tx.commit().await?;

    info!(user_id = %account.id, "Password changed");
    audit::record(
        AuditEntry::builder()
            .user_id(account.id)
            .action(AuditAction::PasswordChange)
            .entity_type("user")
            .entity_id(account.id.into_uuid())
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_password_must_be_strong_and_confirmed() {
        assert!(validate_new_password("Guclu.Sifre42", "Guclu.Sifre42").is_ok());

        match validate_new_password("Guclu.Sifre42", "Guclu.Sifre43") {
            Err(ApiError::Validation { field, .. }) => assert_eq!(field, "new_password_confirm"),
            other => panic!("unexpected {:?}", other),
        }
        match validate_new_password("short", "short") {
            Err(ApiError::Validation { field, .. }) => assert_eq!(field, "new_password"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
