use axum::extract::{Extension, Path, Query};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::common::{
    created, ok, ApiResult, AuthUser, CreatedResult, PageParams, Paged, ReportId, RequestMeta,
};
use crate::domains::reports::activities;
use crate::domains::reports::data::{
    AdminReportQuery, AssignReportInput, CreateReportInput, ResolveReportInput,
};
use crate::domains::reports::models::Report;
use crate::server::app::AppState;
use crate::server::extractors::AdminUser;

pub fn router() -> Router {
    Router::new()
        .route("/reports", post(create_report))
        .route("/reports/me", get(my_reports))
        .route("/admin/reports", get(admin_list))
        .route("/admin/reports/:id", get(admin_get))
        .route("/admin/reports/:id/assign", post(admin_assign))
        .route("/admin/reports/:id/resolve", post(admin_resolve))
}

async fn create_report(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(input): Json<CreateReportInput>,
) -> CreatedResult<Report> {
    created(activities::create_report(input, &user, &state.deps).await?)
}

async fn my_reports(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Report>> {
    ok(activities::my_reports(page, &user, &state.deps).await?)
}

async fn admin_list(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    Query(query): Query<AdminReportQuery>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Report>> {
    ok(activities::admin_list_reports(query, page, &admin, &state.deps).await?)
}

async fn admin_get(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<ReportId>,
) -> ApiResult<Report> {
    ok(activities::admin_get_report(id, &admin, &state.deps).await?)
}

async fn admin_assign(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Path(id): Path<ReportId>,
    Json(input): Json<AssignReportInput>,
) -> ApiResult<Report> {
    ok(activities::assign_report(id, input, &admin, &meta, &state.deps).await?)
}

async fn admin_resolve(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Path(id): Path<ReportId>,
    Json(input): Json<ResolveReportInput>,
) -> ApiResult<Report> {
    ok(activities::resolve_report(id, input, &admin, &meta, &state.deps).await?)
}
