use axum::extract::{Extension, Path, Query};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};

use crate::common::{
    created, ok, ApiResult, AuthUser, CampaignId, CampaignImageId, CampaignUpdateId, CategoryId,
    CreatedResult, PageParams, Paged, RequestMeta,
};
use crate::domains::campaigns::activities::{self, admin, content};
use crate::domains::campaigns::data::{
    AddCampaignImageInput, CampaignDetail, CampaignFlagsInput, CampaignListQuery, CampaignStats,
    CampaignStatusQuery, CreateCampaignInput, CreateCampaignUpdateInput, CreateCategoryInput,
    RejectCampaignInput, ReorderImagesInput, UpdateCampaignInput, UpdateCategoryInput,
};
use crate::domains::campaigns::models::{Campaign, CampaignImage, CampaignUpdate, Category};
use crate::server::app::AppState;
use crate::server::extractors::{AdminUser, MaybeAuthUser};

pub fn router() -> Router {
    Router::new()
        .route("/campaigns", get(list_campaigns).post(create_campaign))
        .route("/campaigns/featured", get(featured_campaigns))
        .route("/campaigns/urgent", get(urgent_campaigns))
        .route("/campaigns/following", get(followed_campaigns))
        .route("/campaigns/slug/:slug", get(get_campaign_by_slug))
        .route(
            "/campaigns/:id",
            get(get_campaign).put(update_campaign).delete(delete_campaign),
        )
        .route("/campaigns/:id/stats", get(campaign_stats))
        .route("/campaigns/:id/submit", post(submit_campaign))
        .route("/campaigns/:id/pause", post(pause_campaign))
        .route("/campaigns/:id/resume", post(resume_campaign))
        .route("/campaigns/:id/complete", post(complete_campaign))
        .route("/campaigns/:id/cancel", post(cancel_campaign))
        .route("/campaigns/:id/revise", post(revise_campaign))
        .route(
            "/campaigns/:id/follow",
            post(follow_campaign).delete(unfollow_campaign),
        )
        .route(
            "/campaigns/:id/updates",
            get(list_updates).post(post_update),
        )
        .route("/campaigns/:id/updates/:update_id", delete(delete_update))
        .route("/campaigns/:id/images", get(list_images).post(add_image))
        .route("/campaigns/:id/images/reorder", put(reorder_images))
        .route("/campaigns/:id/images/:image_id", delete(delete_image))
        .route("/categories", get(list_categories))
        .route("/organizations/me/campaigns", get(my_campaigns))
        .route("/admin/campaigns", get(admin_list))
        .route("/admin/campaigns/:id/approve", post(admin_approve))
        .route("/admin/campaigns/:id/reject", post(admin_reject))
        .route("/admin/campaigns/:id/flags", put(admin_flags))
        .route("/admin/categories", post(admin_create_category))
        .route(
            "/admin/categories/:id",
            put(admin_update_category).delete(admin_deactivate_category),
        )
}

// =============================================================================
// Public
// =============================================================================

async fn list_campaigns(
    Extension(state): Extension<AppState>,
    Query(query): Query<CampaignListQuery>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Campaign>> {
    ok(activities::list_campaigns(query, page, &state.deps).await?)
}

async fn featured_campaigns(Extension(state): Extension<AppState>) -> ApiResult<Vec<Campaign>> {
    ok(activities::featured_campaigns(&state.deps).await?)
}

async fn urgent_campaigns(Extension(state): Extension<AppState>) -> ApiResult<Vec<Campaign>> {
    ok(activities::urgent_campaigns(&state.deps).await?)
}

async fn get_campaign(
    Extension(state): Extension<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<CampaignId>,
) -> ApiResult<CampaignDetail> {
    ok(activities::get_campaign(id, viewer.as_ref(), &state.deps).await?)
}

async fn get_campaign_by_slug(
    Extension(state): Extension<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(slug): Path<String>,
) -> ApiResult<CampaignDetail> {
    ok(activities::get_campaign_by_slug(&slug, viewer.as_ref(), &state.deps).await?)
}

async fn campaign_stats(
    Extension(state): Extension<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<CampaignId>,
) -> ApiResult<CampaignStats> {
    ok(activities::campaign_stats(id, viewer.as_ref(), &state.deps).await?)
}

async fn list_categories(Extension(state): Extension<AppState>) -> ApiResult<Vec<Category>> {
    ok(activities::list_categories(&state.deps).await?)
}

async fn follow_campaign(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> ApiResult<()> {
    ok(activities::follow_campaign(id, &user, &state.deps).await?)
}

async fn unfollow_campaign(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> ApiResult<()> {
    ok(activities::unfollow_campaign(id, &user, &state.deps).await?)
}

async fn followed_campaigns(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Campaign>> {
    ok(activities::followed_campaigns(page, &user, &state.deps).await?)
}

// =============================================================================
// Owner
// =============================================================================

async fn create_campaign(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(input): Json<CreateCampaignInput>,
) -> CreatedResult<CampaignDetail> {
    created(activities::create_campaign(input, &user, &state.deps).await?)
}

async fn update_campaign(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Json(input): Json<UpdateCampaignInput>,
) -> ApiResult<CampaignDetail> {
    ok(activities::update_campaign(id, input, &user, &state.deps).await?)
}

async fn delete_campaign(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> ApiResult<()> {
    ok(activities::delete_campaign(id, &user, &state.deps).await?)
}

async fn submit_campaign(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> ApiResult<CampaignDetail> {
    ok(activities::submit_campaign(id, &user, &state.deps).await?)
}

async fn pause_campaign(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> ApiResult<CampaignDetail> {
    ok(activities::pause_campaign(id, &user, &state.deps).await?)
}

async fn resume_campaign(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> ApiResult<CampaignDetail> {
    ok(activities::resume_campaign(id, &user, &state.deps).await?)
}

async fn complete_campaign(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> ApiResult<CampaignDetail> {
    ok(activities::complete_campaign(id, &user, &state.deps).await?)
}

async fn cancel_campaign(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> ApiResult<CampaignDetail> {
    ok(activities::cancel_campaign(id, &user, &state.deps).await?)
}

async fn revise_campaign(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
) -> ApiResult<CampaignDetail> {
    ok(activities::revise_campaign(id, &user, &state.deps).await?)
}

async fn my_campaigns(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(query): Query<CampaignStatusQuery>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Campaign>> {
    ok(activities::my_campaigns(query, page, &user, &state.deps).await?)
}

// =============================================================================
// Admin
// =============================================================================

async fn admin_list(
    Extension(state): Extension<AppState>,
    AdminUser(admin_user): AdminUser,
    Query(query): Query<CampaignStatusQuery>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Campaign>> {
    ok(admin::list_campaigns(query, page, &admin_user, &state.deps).await?)
}

async fn admin_approve(
    Extension(state): Extension<AppState>,
    AdminUser(admin_user): AdminUser,
    meta: RequestMeta,
    Path(id): Path<CampaignId>,
) -> ApiResult<Campaign> {
    ok(admin::approve_campaign(id, &admin_user, &meta, &state.deps).await?)
}

async fn admin_reject(
    Extension(state): Extension<AppState>,
    AdminUser(admin_user): AdminUser,
    meta: RequestMeta,
    Path(id): Path<CampaignId>,
    Json(input): Json<RejectCampaignInput>,
) -> ApiResult<Campaign> {
    ok(admin::reject_campaign(id, input, &admin_user, &meta, &state.deps).await?)
}

async fn admin_flags(
    Extension(state): Extension<AppState>,
    AdminUser(admin_user): AdminUser,
    meta: RequestMeta,
    Path(id): Path<CampaignId>,
    Json(input): Json<CampaignFlagsInput>,
) -> ApiResult<Campaign> {
    ok(admin::set_flags(id, input, &admin_user, &meta, &state.deps).await?)
}

async fn admin_create_category(
    Extension(state): Extension<AppState>,
    AdminUser(admin_user): AdminUser,
    meta: RequestMeta,
    Json(input): Json<CreateCategoryInput>,
) -> CreatedResult<Category> {
    created(admin::create_category(input, &admin_user, &meta, &state.deps).await?)
}

async fn admin_update_category(
    Extension(state): Extension<AppState>,
    AdminUser(admin_user): AdminUser,
    meta: RequestMeta,
    Path(id): Path<CategoryId>,
    Json(input): Json<UpdateCategoryInput>,
) -> ApiResult<Category> {
    ok(admin::update_category(id, input, &admin_user, &meta, &state.deps).await?)
}

async fn admin_deactivate_category(
    Extension(state): Extension<AppState>,
    AdminUser(admin_user): AdminUser,
    meta: RequestMeta,
    Path(id): Path<CategoryId>,
) -> ApiResult<Category> {
    ok(admin::deactivate_category(id, &admin_user, &meta, &state.deps).await?)
}

// =============================================================================
// Updates and images
// =============================================================================

async fn list_updates(
    Extension(state): Extension<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<CampaignId>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<CampaignUpdate>> {
    ok(content::list_updates(id, page, viewer.as_ref(), &state.deps).await?)
}

async fn post_update(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Json(input): Json<CreateCampaignUpdateInput>,
) -> CreatedResult<CampaignUpdate> {
    created(content::post_update(id, input, &user, &state.deps).await?)
}

async fn delete_update(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path((id, update_id)): Path<(CampaignId, CampaignUpdateId)>,
) -> ApiResult<()> {
    ok(content::delete_update(id, update_id, &user, &state.deps).await?)
}

async fn list_images(
    Extension(state): Extension<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<CampaignId>,
) -> ApiResult<Vec<CampaignImage>> {
    ok(content::list_images(id, viewer.as_ref(), &state.deps).await?)
}

async fn add_image(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Json(input): Json<AddCampaignImageInput>,
) -> CreatedResult<CampaignImage> {
    created(content::add_image(id, input, &user, &state.deps).await?)
}

async fn delete_image(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path((id, image_id)): Path<(CampaignId, CampaignImageId)>,
) -> ApiResult<()> {
    ok(content::delete_image(id, image_id, &user, &state.deps).await?)
}

async fn reorder_images(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<CampaignId>,
    Json(input): Json<ReorderImagesInput>,
) -> ApiResult<Vec<CampaignImage>> {
    ok(content::reorder_images(id, input, &user, &state.deps).await?)
}
