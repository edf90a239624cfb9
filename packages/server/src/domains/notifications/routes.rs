use axum::extract::{Extension, Path, Query};
use axum::routing::{delete, get, post};
use axum::Router;
use serde::Deserialize;

use crate::common::{ok, ok_with_message, ApiResult, AuthUser, NotificationId, PageParams, Paged};
use crate::domains::notifications::activities::{self, MarkedRead, UnreadCount};
use crate::domains::notifications::models::Notification;
use crate::server::app::AppState;

pub fn router() -> Router {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/:id/read", post(mark_read))
        .route("/notifications/:id", delete(delete_notification))
}

#[derive(Debug, Deserialize)]
struct NotificationQuery {
    #[serde(default)]
    unread_only: bool,
}

async fn list_notifications(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(query): Query<NotificationQuery>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Notification>> {
    ok(activities::list_notifications(query.unread_only, page, &user, &state.deps).await?)
}

async fn unread_count(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<UnreadCount> {
    ok(activities::unread_count(&user, &state.deps).await?)
}

async fn mark_read(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<NotificationId>,
) -> ApiResult<Notification> {
    ok(activities::mark_read(id, &user, &state.deps).await?)
}

async fn mark_all_read(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<MarkedRead> {
    ok(activities::mark_all_read(&user, &state.deps).await?)
}

async fn delete_notification(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<NotificationId>,
) -> ApiResult<()> {
    activities::delete_notification(id, &user, &state.deps).await?;
    ok_with_message((), "Notification deleted")
}
