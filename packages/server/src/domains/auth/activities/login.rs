use anyhow::Result;
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::common::validation::email;
use crate::common::{ApiError, RequestMeta};
use crate::domains::audit::{self, AuditAction, AuditEntry};
use crate::domains::auth::activities::tokens::{invalid_credentials, issue_tokens};
use crate::domains::auth::data::{AuthTokens, LoginInput};
use crate::domains::auth::models::{LoginHistory, User, UserProfile};
use crate::domains::auth::password::verify_password;
use crate::kernel::ServerDeps;

/// Failed attempts before the account is locked
pub const MAX_FAILED_ATTEMPTS: i32 = 5;
pub const LOCKOUT_MINUTES: i32 = 15;

/// Authenticate with e-mail and password.
///
/// Unknown e-mail, wrong password and a locked account all produce the same
/// 401 so the response never reveals which accounts exist.
pub async fn login(input: LoginInput, meta: &RequestMeta, deps: &ServerDeps) -> Result<AuthTokens> {
    let email = email::normalize(&input.email);

    let Some(user) = User::find_by_email(&email, &deps.db_pool).await? else {
        info!("Login attempt for unknown e-mail");
        return Err(invalid_credentials());
    };

    if user.is_locked_at(Utc::now()) {
        warn!(user_id = %user.id, "Login attempt on locked account");
        LoginHistory::record(user.id, meta, false, Some("ACCOUNT_LOCKED"), &deps.db_pool).await?;
        return Err(invalid_credentials());
    }

    if !verify_password(&input.password, &user.password_hash) {
        let updated = User::record_failed_login(
            user.id,
            MAX_FAILED_ATTEMPTS,
            LOCKOUT_MINUTES,
            &deps.db_pool,
        )
        .await?;
        LoginHistory::record(user.id, meta, false, Some("INVALID_PASSWORD"), &deps.db_pool).await?;

        let locked = updated.is_locked_at(Utc::now());
        if locked {
            warn!(user_id = %user.id, minutes = LOCKOUT_MINUTES, "Account locked after repeated failures");
        }
        audit::record(
            AuditEntry::builder()
                .user_id(user.id)
                .action(AuditAction::LoginFailed)
                .entity_type("user")
                .entity_id(user.id.into_uuid())
                .new_values(json!({ "locked": locked }))
                .meta(meta.clone())
                .build(),
            deps,
        )
        .await;
        return Err(invalid_credentials());
    }

    if user.status.blocks_login() {
        LoginHistory::record(user.id, meta, false, Some("ACCOUNT_DISABLED"), &deps.db_pool).await?;
        return Err(ApiError::forbidden(format!(
            "Account is {}",
            user.status.to_string().to_lowercase()
        ))
        .into());
    }

    let user = User::record_successful_login(user.id, &deps.db_pool).await?;
    LoginHistory::record(user.id, meta, true, None, &deps.db_pool).await?;
    let profile = UserProfile::find_by_user(user.id, &deps.db_pool).await?;

    let user_id = user.id;
    let mut conn = deps.db_pool.acquire().await?;
    let tokens = issue_tokens(user, profile, meta, &mut conn, deps).await?;

    info!(user_id = %user_id, "User logged in");
    audit::record(
        AuditEntry::builder()
            .user_id(user_id)
            .action(AuditAction::UserLogin)
            .entity_type("user")
            .entity_id(user_id.into_uuid())
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    Ok(tokens)
}
