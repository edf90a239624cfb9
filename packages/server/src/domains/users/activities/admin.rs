//! Admin user management

use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::common::{AdminCapability, ApiError, AuthUser, PageParams, Paged, RequestMeta, UserId};
use crate::domains::audit::{self, AuditAction, AuditEntry};
use crate::domains::auth::models::{
    LoginHistory, RefreshToken, User, UserFilter, UserProfile,
};
use crate::domains::auth::UserData;
use crate::domains::users::data::{ChangeRoleInput, ChangeStatusInput, UserListQuery};
use crate::kernel::ServerDeps;

async fn require_manage_users(admin: &AuthUser, deps: &ServerDeps) -> Result<()> {
    admin
        .actor()
        .can(AdminCapability::ManageUsers)
        .check(deps)
        .await?;
    Ok(())
}

async fn load_user_data(id: UserId, deps: &ServerDeps) -> Result<UserData> {
    let user = User::find_by_id_optional(id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    let profile = UserProfile::find_by_user(id, &deps.db_pool).await?;
    Ok(UserData::new(user, profile))
}

pub async fn list_users(
    query: UserListQuery,
    page: PageParams,
    admin: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<UserData>> {
    require_manage_users(admin, deps).await?;

    let filter = UserFilter {
        email: query.email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()),
        role: query.role,
        status: query.status,
    };
    let users = User::find_filtered(&filter, page.limit(), page.offset(), &deps.db_pool).await?;
    let total = User::count_filtered(&filter, &deps.db_pool).await?;

    let mut items = Vec::with_capacity(users.len());
    for user in users {
        let profile = UserProfile::find_by_user(user.id, &deps.db_pool).await?;
        items.push(UserData::new(user, profile));
    }
    Ok(Paged::new(items, page, total))
}

pub async fn get_user(id: UserId, admin: &AuthUser, deps: &ServerDeps) -> Result<UserData> {
    require_manage_users(admin, deps).await?;
    load_user_data(id, deps).await
}

pub async fn user_login_history(
    id: UserId,
    page: PageParams,
    admin: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<LoginHistory>> {
    require_manage_users(admin, deps).await?;
    let items = LoginHistory::find_for_user(id, page.limit(), page.offset(), &deps.db_pool).await?;
    let total = LoginHistory::count_for_user(id, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

/// Suspending or deactivating an account also ends its sessions.
pub async fn change_status(
    id: UserId,
    input: ChangeStatusInput,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<UserData> {
    require_manage_users(admin, deps).await?;
    if id == admin.user_id {
        return Err(ApiError::bad_request("You cannot change your own status").into());
    }

    let before = User::find_by_id_optional(id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    User::set_status(id, input.status, &deps.db_pool).await?;

    if input.status.blocks_login() {
        let mut conn = deps.db_pool.acquire().await?;
        RefreshToken::revoke_all_for_user(id, &mut conn).await?;
    }

    info!(user_id = %id, from = %before.status, to = %input.status, admin_id = %admin.user_id, "User status changed");
    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::UserStatusChange)
            .entity_type("user")
            .entity_id(id.into_uuid())
            .old_values(json!({ "status": before.status }))
            .new_values(json!({ "status": input.status, "reason": input.reason }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    load_user_data(id, deps).await
}

pub async fn change_role(
    id: UserId,
    input: ChangeRoleInput,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<UserData> {
    require_manage_users(admin, deps).await?;
    if id == admin.user_id {
        return Err(ApiError::bad_request("You cannot change your own role").into());
    }

    let before = User::find_by_id_optional(id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    User::set_role(id, input.role, &deps.db_pool).await?;

    info!(user_id = %id, from = %before.role, to = %input.role, "User role changed");
    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::UserRoleChange)
            .entity_type("user")
            .entity_id(id.into_uuid())
            .old_values(json!({ "role": before.role }))
            .new_values(json!({ "role": input.role }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    load_user_data(id, deps).await
}

pub async fn unlock_user(
    id: UserId,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<UserData> {
    require_manage_users(admin, deps).await?;
    if User::find_by_id_optional(id, &deps.db_pool).await?.is_none() {
        return Err(ApiError::not_found("User").into());
    }
    User::unlock(id, &deps.db_pool).await?;

    info!(user_id = %id, "User unlocked");
    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::UserUnlock)
            .entity_type("user")
            .entity_id(id.into_uuid())
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    load_user_data(id, deps).await
}

