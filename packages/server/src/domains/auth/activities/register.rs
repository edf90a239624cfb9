use anyhow::Result;
use serde_json::json;
use tracing::{debug, info};

use crate::common::utils::{generate_token, hash_token};
use crate::common::validation::{email, password, require_text};
use crate::common::{ApiError, RequestMeta, UserRole};
use crate::domains::audit::{self, AuditAction, AuditEntry};
use crate::domains::auth::activities::tokens::issue_tokens;
use crate::domains::auth::data::{AuthTokens, RegisterInput};
use crate::domains::auth::models::{OneTimeToken, OneTimeTokenKind, User, UserProfile, UserStatus};
use crate::domains::auth::password::hash_password;
use crate::kernel::ServerDeps;

/// Field-level checks that need no database access.
pub(crate) fn validate_registration(input: &RegisterInput) -> Result<(), ApiError> {
    email::validate(&input.email).into_api_result("email")?;
    password::validate(&input.password).into_api_result("password")?;
    if input.password != input.password_confirm {
        return Err(ApiError::validation("password_confirm", "Passwords do not match"));
    }
    require_text("first_name", &input.first_name)?;
    require_text("last_name", &input.last_name)?;
    if let Some(role) = input.role {
        if !role.is_self_assignable() {
            return Err(ApiError::validation(
                "role",
                "Only DONOR or FOUNDATION can be chosen at registration",
            ));
        }
    }
    Ok(())
}

/// Create an account, its profile and an e-mail verification token.
///
/// Addresses listed in `ADMIN_EMAILS` are promoted to ADMIN.
pub async fn register(
    input: RegisterInput,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<AuthTokens> {
    validate_registration(&input)?;

    let email = email::normalize(&input.email);
    if User::email_exists(&email, &deps.db_pool).await? {
        return Err(ApiError::conflict("Email is already registered").into());
    }

    let role = if deps.is_admin_email(&email) {
        UserRole::Admin
    } else {
        input.role.unwrap_or(UserRole::Donor)
    };
    let password_hash = hash_password(&input.password)?;
    let verification_token = generate_token();

    let mut tx = deps.db_pool.begin().await?;
    let user = User::create(
        &email,
        &password_hash,
        role,
        UserStatus::PendingVerification,
        &mut tx,
    )
    .await?;
    let profile = UserProfile::create(
        user.id,
        input.first_name.trim(),
        input.last_name.trim(),
        &mut tx,
    )
    .await?;
    OneTimeToken::create(
        OneTimeTokenKind::EmailVerification,
        user.id,
        &hash_token(&verification_token),
        &mut tx,
    )
    .await?;
    let user_id = user.id;
    let tokens = issue_tokens(user, Some(profile), meta, &mut tx, deps).await?;
    tx.commit().await?;

    // No mail transport: the raw token only ever appears in debug logs.
    debug!(user_id = %user_id, token = %verification_token, "E-mail verification token issued");
    info!(user_id = %user_id, role = %role, "User registered");

    audit::record(
        AuditEntry::builder()
            .user_id(user_id)
            .action(AuditAction::UserRegister)
            .entity_type("user")
            .entity_id(user_id.into_uuid())
            .new_values(json!({ "email": email, "role": role }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    Ok(tokens)
}
