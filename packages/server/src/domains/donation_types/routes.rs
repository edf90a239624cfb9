use axum::extract::{Extension, Path};
use axum::routing::get;
use axum::Router;

use crate::common::{ok, ApiResult};
use crate::domains::donation_types::activities;
use crate::domains::donation_types::models::DonationType;
use crate::server::app::AppState;

pub fn router() -> Router {
    Router::new()
        .route("/donation-types", get(list_donation_types))
        .route("/donation-types/active", get(active_donation_types))
        .route("/donation-types/:code", get(get_donation_type))
}

async fn list_donation_types(Extension(state): Extension<AppState>) -> ApiResult<Vec<DonationType>> {
    ok(activities::list_donation_types(&state.deps).await?)
}

async fn active_donation_types(
    Extension(state): Extension<AppState>,
) -> ApiResult<Vec<DonationType>> {
    ok(activities::active_donation_types(&state.deps).await?)
}

async fn get_donation_type(
    Extension(state): Extension<AppState>,
    Path(code): Path<String>,
) -> ApiResult<DonationType> {
    ok(activities::get_donation_type(&code, &state.deps).await?)
}
