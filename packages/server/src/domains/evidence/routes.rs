use axum::extract::{Extension, Path, Query};
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::common::{
    created, ok, ApiResult, AuthUser, CampaignId, CreatedResult, EvidenceDocumentId, EvidenceId,
    PageParams, Paged, RequestMeta,
};
use crate::domains::evidence::activities;
use crate::domains::evidence::data::{
    CreateEvidenceInput, DocumentInput, EvidenceDetail, EvidenceStatusQuery, MyEvidenceQuery,
    ReviewEvidenceInput, UpdateEvidenceInput,
};
use crate::domains::evidence::models::{Evidence, EvidenceDocument};
use crate::server::app::AppState;
use crate::server::extractors::{AdminUser, MaybeAuthUser};

pub fn router() -> Router {
    Router::new()
        .route("/evidences", post(create_evidence))
        .route("/evidences/me", get(my_evidences))
        .route(
            "/evidences/:id",
            get(get_evidence).put(update_evidence).delete(delete_evidence),
        )
        .route("/evidences/:id/documents", post(add_document))
        .route(
            "/evidences/:id/documents/:document_id",
            delete(remove_document),
        )
        .route("/campaigns/:id/evidences", get(campaign_evidences))
        .route("/admin/evidences", get(admin_list))
        .route("/admin/evidences/:id/review", post(admin_review))
}

async fn create_evidence(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(input): Json<CreateEvidenceInput>,
) -> CreatedResult<EvidenceDetail> {
    created(activities::create_evidence(input, &user, &state.deps).await?)
}

async fn my_evidences(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(query): Query<MyEvidenceQuery>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Evidence>> {
    ok(activities::my_evidences(query, page, &user, &state.deps).await?)
}

async fn get_evidence(
    Extension(state): Extension<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<EvidenceId>,
) -> ApiResult<EvidenceDetail> {
    ok(activities::get_evidence(id, viewer.as_ref(), &state.deps).await?)
}

async fn update_evidence(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<EvidenceId>,
    Json(input): Json<UpdateEvidenceInput>,
) -> ApiResult<EvidenceDetail> {
    ok(activities::update_evidence(id, input, &user, &state.deps).await?)
}

async fn delete_evidence(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<EvidenceId>,
) -> ApiResult<()> {
    ok(activities::delete_evidence(id, &user, &state.deps).await?)
}

async fn add_document(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<EvidenceId>,
    Json(input): Json<DocumentInput>,
) -> CreatedResult<EvidenceDocument> {
    created(activities::add_document(id, input, &user, &state.deps).await?)
}

async fn remove_document(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path((id, document_id)): Path<(EvidenceId, EvidenceDocumentId)>,
) -> ApiResult<()> {
    ok(activities::remove_document(id, document_id, &user, &state.deps).await?)
}

async fn campaign_evidences(
    Extension(state): Extension<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<CampaignId>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Evidence>> {
    ok(activities::campaign_evidences(id, page, viewer.as_ref(), &state.deps).await?)
}

async fn admin_list(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    Query(query): Query<EvidenceStatusQuery>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Evidence>> {
    ok(activities::admin_list_evidences(query, page, &admin, &state.deps).await?)
}

async fn admin_review(
    Extension(state): Extension<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Path(id): Path<EvidenceId>,
    Json(input): Json<ReviewEvidenceInput>,
) -> ApiResult<Evidence> {
    ok(activities::review_evidence(id, input, &admin, &meta, &state.deps).await?)
}
