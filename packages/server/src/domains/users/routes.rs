use axum::extract::{Extension, Path, Query};
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::common::{ok, ApiResult, AuthUser, PageParams, Paged, RequestMeta, UserId};
use crate::domains::auth::models::LoginHistory;
use crate::domains::auth::UserData;
use crate::domains::users::activities;
use crate::domains::users::data::{
    ChangeRoleInput, ChangeStatusInput, UpdateProfileInput, UserListQuery,
};
use crate::domains::users::models::{PreferenceChanges, UserPreference};
use crate::server::app::AppState;
use crate::server::extractors::AdminUser;

pub fn router() -> Router {
    Router::new()
        .route("/users/me", get(get_me).put(update_me))
        .route("/users/me/login-history", get(my_login_history))
        .route(
            "/users/me/preferences",
            get(get_preferences).put(update_preferences),
        )
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id", get(get_user))
        .route("/admin/users/:id/status", put(change_status))
        .route("/admin/users/:id/role", put(change_role))
        .route("/admin/users/:id/unlock", post(unlock_user))
        .route("/admin/users/:id/login-history", get(user_login_history))
}

async fn get_me(Extension(state): Extension<AppState>, user: AuthUser) -> ApiResult<UserData> {
    ok(activities::get_me(&user, &state.deps).await?)
}

async fn update_me(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    meta: RequestMeta,
    Json(input): Json<UpdateProfileInput>,
) -> ApiResult<UserData> {
    ok(activities::update_me(input, &user, &meta, &state.deps).await?)
}

async fn get_preferences(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<UserPreference> {
    ok(activities::get_preferences(&user, &state.deps).await?)
}

async fn update_preferences(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(changes): Json<PreferenceChanges>,
) -> ApiResult<UserPreference> {
    ok(activities::update_preferences(changes, &user, &state.deps).await?)
}

async fn my_login_history(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<LoginHistory>> {
    ok(activities::my_login_history(page, &user, &state.deps).await?)
}

async fn list_users(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    Query(query): Query<UserListQuery>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<UserData>> {
    ok(activities::list_users(query, page, &admin, &state.deps).await?)
}

async fn get_user(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<UserId>,
) -> ApiResult<UserData> {
    ok(activities::get_user(id, &admin, &state.deps).await?)
}

async fn change_status(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Path(id): Path<UserId>,
    Json(input): Json<ChangeStatusInput>,
) -> ApiResult<UserData> {
    ok(activities::change_status(id, input, &admin, &meta, &state.deps).await?)
}

async fn change_role(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Path(id): Path<UserId>,
    Json(input): Json<ChangeRoleInput>,
) -> ApiResult<UserData> {
    ok(activities::change_role(id, input, &admin, &meta, &state.deps).await?)
}

async fn unlock_user(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Path(id): Path<UserId>,
) -> ApiResult<UserData> {
    ok(activities::unlock_user(id, &admin, &meta, &state.deps).await?)
}

async fn user_login_history(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<UserId>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<LoginHistory>> {
    ok(activities::user_login_history(id, page, &admin, &state.deps).await?)
}
