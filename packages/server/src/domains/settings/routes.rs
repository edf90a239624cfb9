use std::collections::BTreeMap;

use axum::extract::{Extension, Path};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::Value as JsonValue;

use crate::common::{created, ok, ApiResult, CreatedResult, RequestMeta};
use crate::domains::settings::activities::{self, CreateSettingInput, UpdateSettingInput};
use crate::domains::settings::models::SystemSetting;
use crate::server::app::AppState;
use crate::server::extractors::AdminUser;

pub fn router() -> Router {
    Router::new()
        .route("/settings/public", get(public_settings))
        .route("/admin/settings", get(list_settings).post(create_setting))
        .route(
            "/admin/settings/:key",
            put(update_setting).delete(delete_setting),
        )
}

async fn public_settings(
    Extension(state): Extension<AppState>,
) -> ApiResult<BTreeMap<String, JsonValue>> {
    ok(activities::public_settings(&state.deps).await?)
}

async fn list_settings(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
) -> ApiResult<Vec<SystemSetting>> {
    ok(activities::list_settings(&admin, &state.deps).await?)
}

async fn create_setting(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Json(input): Json<CreateSettingInput>,
) -> CreatedResult<SystemSetting> {
    created(activities::create_setting(input, &admin, &meta, &state.deps).await?)
}

async fn update_setting(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Path(key): Path<String>,
    Json(input): Json<UpdateSettingInput>,
) -> ApiResult<SystemSetting> {
    ok(activities::update_setting(&key, input, &admin, &meta, &state.deps).await?)
}

async fn delete_setting(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Path(key): Path<String>,
) -> ApiResult<()> {
    ok(activities::delete_setting(&key, &admin, &meta, &state.deps).await?)
}
