use anyhow::Result;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::common::{ApiError, AuthUser, NotificationId, PageParams, Paged, UserId};
use crate::domains::notifications::models::{Notification, NotificationType};
use crate::kernel::ServerDeps;

/// Fire-and-forget notification. Errors are logged and swallowed so a
/// notification problem never rolls back the operation that triggered it.
pub async fn notify(
    user_id: UserId,
    notification_type: NotificationType,
    title: &str,
    message: &str,
    data: Option<JsonValue>,
    deps: &ServerDeps,
) {
    match Notification::create(user_id, notification_type, title, message, data, &deps.db_pool)
        .await
    {
        Ok(n) => debug!(notification_id = %n.id, user_id = %user_id, kind = ?notification_type, "Notification created"),
        Err(e) => warn!(error = %e, user_id = %user_id, kind = ?notification_type, "Failed to create notification"),
    }
}

pub async fn list_notifications(
    unread_only: bool,
    page: PageParams,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<Notification>> {
    let items = Notification::find_for_user(
        user.user_id,
        unread_only,
        page.limit(),
        page.offset(),
        &deps.db_pool,
    )
    .await?;
    let total = Notification::count_for_user(user.user_id, unread_only, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread_count: i64,
}

pub async fn unread_count(user: &AuthUser, deps: &ServerDeps) -> Result<UnreadCount> {
    let unread_count = Notification::count_for_user(user.user_id, true, &deps.db_pool).await?;
    Ok(UnreadCount { unread_count })
}

pub async fn mark_read(
    id: NotificationId,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Notification> {
    Notification::mark_read(id, user.user_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Notification").into())
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

pub async fn mark_all_read(user: &AuthUser, deps: &ServerDeps) -> Result<MarkedRead> {
    let updated = Notification::mark_all_read(user.user_id, &deps.db_pool).await?;
    Ok(MarkedRead { updated })
}

pub async fn delete_notification(
    id: NotificationId,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<()> {
    if !Notification::delete(id, user.user_id, &deps.db_pool).await? {
        return Err(ApiError::not_found("Notification").into());
    }
    Ok(())
}
