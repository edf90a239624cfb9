use axum::extract::Extension;
use axum::routing::get;
use axum::Router;

use crate::common::{ok, ApiResult};
use crate::domains::dashboard::activities::{self, DashboardStats};
use crate::server::app::AppState;
use crate::server::extractors::AdminUser;

pub fn router() -> Router {
    Router::new().route("/admin/dashboard", get(get_dashboard))
}

async fn get_dashboard(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
) -> ApiResult<DashboardStats> {
    ok(activities::dashboard(&admin, &state.deps).await?)
}
