use axum::extract::{Extension, Path, Query};
use axum::routing::{get, post};
use axum::Router;

use crate::common::{ok, ApiResult, OrganizationId, PageParams, Paged, RequestMeta};
use crate::domains::transparency::activities::{self, LeaderboardEntry, TransparencyScoreData};
use crate::domains::transparency::models::ScoreHistory;
use crate::server::app::AppState;
use crate::server::extractors::AdminUser;

pub fn router() -> Router {
    Router::new()
        .route("/organizations/:id/transparency", get(get_score))
        .route("/organizations/:id/transparency/history", get(get_history))
        .route("/transparency/leaderboard", get(leaderboard))
        .route(
            "/admin/organizations/:id/transparency/recalculate",
            post(recalculate),
        )
}

async fn get_score(
    Extension(state): Extension<AppState>,
    Path(id): Path<OrganizationId>,
) -> ApiResult<TransparencyScoreData> {
    ok(activities::get_score(id, &state.deps).await?)
}

async fn get_history(
    Extension(state): Extension<AppState>,
    Path(id): Path<OrganizationId>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<ScoreHistory>> {
    ok(activities::get_history(id, page, &state.deps).await?)
}

async fn leaderboard(
    Extension(state): Extension<AppState>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<LeaderboardEntry>> {
    ok(activities::leaderboard(page, &state.deps).await?)
}

async fn recalculate(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Path(id): Path<OrganizationId>,
) -> ApiResult<TransparencyScoreData> {
    ok(activities::recalculate(id, &admin, &meta, &state.deps).await?)
}
