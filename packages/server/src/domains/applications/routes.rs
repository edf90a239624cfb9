use axum::extract::{Extension, Path, Query};
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::common::{
    created, ok, ApiResult, ApplicationDocumentId, ApplicationId, AuthUser, CreatedResult,
    PageParams, Paged, RequestMeta,
};
use crate::domains::applications::activities;
use crate::domains::applications::data::{
    AdminApplicationQuery, ApplicationDetail, ApplicationStats, AssignCampaignInput,
    AssignOrganizationInput, CreateApplicationInput, DocumentInput, ReviewApplicationInput,
    UpdateApplicationInput,
};
use crate::domains::applications::models::{Application, ApplicationDocument};
use crate::server::app::AppState;
use crate::server::extractors::AdminUser;

pub fn router() -> Router {
    Router::new()
        .route("/applications", post(create_application))
        .route("/applications/my", get(my_applications))
        .route(
            "/applications/my/:id",
            get(my_application)
                .put(update_application)
                .delete(cancel_application),
        )
        .route("/applications/my/:id/documents", post(add_document))
        .route(
            "/applications/my/:id/documents/:document_id",
            delete(remove_document),
        )
        .route("/applications/assigned", get(assigned_applications))
        .route("/applications/:id/assign-campaign", post(assign_campaign))
        .route("/applications/:id/complete", post(complete_application))
        .route("/admin/applications", get(admin_list))
        .route("/admin/applications/stats", get(admin_stats))
        .route("/admin/applications/:id", get(admin_get))
        .route("/admin/applications/:id/review", post(admin_review))
        .route(
            "/admin/applications/:id/assign-organization",
            post(admin_assign_organization),
        )
        .route(
            "/admin/applications/:id/documents/:document_id/verify",
            post(admin_verify_document),
        )
}

// =============================================================================
// Applicant
// =============================================================================

async fn create_application(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(input): Json<CreateApplicationInput>,
) -> CreatedResult<ApplicationDetail> {
    created(activities::create_application(input, &user, &state.deps).await?)
}

async fn my_applications(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<Application>> {
    ok(activities::my_applications(&user, &state.deps).await?)
}

async fn my_application(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<ApplicationId>,
) -> ApiResult<ApplicationDetail> {
    ok(activities::my_application(id, &user, &state.deps).await?)
}

async fn update_application(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<ApplicationId>,
    Json(input): Json<UpdateApplicationInput>,
) -> ApiResult<Application> {
    ok(activities::update_application(id, input, &user, &state.deps).await?)
}

async fn cancel_application(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<ApplicationId>,
) -> ApiResult<()> {
    ok(activities::cancel_application(id, &user, &state.deps).await?)
}

async fn add_document(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<ApplicationId>,
    Json(input): Json<DocumentInput>,
) -> CreatedResult<ApplicationDocument> {
    created(activities::add_document(id, input, &user, &state.deps).await?)
}

async fn remove_document(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path((id, document_id)): Path<(ApplicationId, ApplicationDocumentId)>,
) -> ApiResult<()> {
    ok(activities::remove_document(id, document_id, &user, &state.deps).await?)
}

// =============================================================================
// Organization
// =============================================================================

async fn assigned_applications(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Application>> {
    ok(activities::assigned_applications(page, &user, &state.deps).await?)
}

async fn assign_campaign(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<ApplicationId>,
    Json(input): Json<AssignCampaignInput>,
) -> ApiResult<Application> {
    ok(activities::assign_campaign(id, input, &user, &state.deps).await?)
}

async fn complete_application(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<ApplicationId>,
) -> ApiResult<Application> {
    ok(activities::complete_application(id, &user, &state.deps).await?)
}

// =============================================================================
// Admin
// =============================================================================

async fn admin_list(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    Query(query): Query<AdminApplicationQuery>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Application>> {
    ok(activities::admin_list_applications(query, page, &admin, &state.deps).await?)
}

async fn admin_stats(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
) -> ApiResult<ApplicationStats> {
    ok(activities::application_stats(&admin, &state.deps).await?)
}

async fn admin_get(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<ApplicationId>,
) -> ApiResult<ApplicationDetail> {
    ok(activities::admin_get_application(id, &admin, &state.deps).await?)
}

async fn admin_review(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Path(id): Path<ApplicationId>,
    Json(input): Json<ReviewApplicationInput>,
) -> ApiResult<Application> {
    ok(activities::review_application(id, input, &admin, &meta, &state.deps).await?)
}

async fn admin_assign_organization(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Path(id): Path<ApplicationId>,
    Json(input): Json<AssignOrganizationInput>,
) -> ApiResult<Application> {
    ok(activities::assign_organization(id, input, &admin, &meta, &state.deps).await?)
}

async fn admin_verify_document(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Path((id, document_id)): Path<(ApplicationId, ApplicationDocumentId)>,
) -> ApiResult<ApplicationDocument> {
    ok(activities::verify_document(id, document_id, &admin, &meta, &state.deps).await?)
}
