use anyhow::Result;
use tracing::info;

use crate::common::AuthUser;
use crate::domains::users::models::{PreferenceChanges, UserPreference};
use crate::kernel::ServerDeps;

pub async fn get_preferences(user: &AuthUser, deps: &ServerDeps) -> Result<UserPreference> {
    UserPreference::get_or_create(user.user_id, &deps.db_pool).await
}

pub async fn update_preferences(
    changes: PreferenceChanges,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<UserPreference> {
    let preference = UserPreference::upsert(user.user_id, changes, &deps.db_pool).await?;
    info!(user_id = %user.user_id, "Preferences updated");
    Ok(preference)
}
