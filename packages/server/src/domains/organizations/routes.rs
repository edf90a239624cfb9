use axum::extract::{Extension, Path, Query};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};

use crate::common::{
    created, ok, ApiResult, AuthUser, BankAccountId, ContactId, CreatedResult, DocumentId,
    OrganizationId, PageParams, Paged, RequestMeta,
};
use crate::domains::organizations::activities::{self, admin};
use crate::domains::organizations::data::{
    AdminOrganizationQuery, CreateBankAccountInput, CreateContactInput, CreateDocumentInput,
    CreateOrganizationInput, FeaturedInput, OrganizationDetail, OrganizationListQuery,
    OrganizationWorkspace, RejectOrganizationInput, UpdateOrganizationInput,
};
use crate::domains::organizations::models::{
    BankAccount, Organization, OrganizationContact, OrganizationDocument,
};
use crate::server::app::AppState;
use crate::server::extractors::{AdminUser, MaybeAuthUser};

pub fn router() -> Router {
    Router::new()
        .route("/organizations", get(list_organizations).post(create_organization))
        .route("/organizations/me", get(get_mine).put(update_mine))
        .route("/organizations/me/submit", post(submit))
        .route(
            "/organizations/me/bank-accounts",
            get(list_bank_accounts).post(add_bank_account),
        )
        .route(
            "/organizations/me/bank-accounts/:id/primary",
            put(set_primary_bank_account),
        )
        .route("/organizations/me/bank-accounts/:id", delete(delete_bank_account))
        .route("/organizations/me/contacts", get(list_contacts).post(add_contact))
        .route("/organizations/me/contacts/:id", delete(delete_contact))
        .route("/organizations/me/documents", get(list_documents).post(add_document))
        .route("/organizations/me/documents/:id", delete(delete_document))
        .route("/organizations/:id", get(get_organization))
        .route(
            "/organizations/:id/favorite",
            post(add_favorite).delete(remove_favorite),
        )
        .route("/users/me/favorites", get(my_favorites))
        .route("/admin/organizations", get(admin_list))
        .route("/admin/organizations/:id", get(admin_get))
        .route("/admin/organizations/:id/verify", post(admin_verify))
        .route("/admin/organizations/:id/reject", post(admin_reject))
        .route("/admin/organizations/:id/featured", put(admin_featured))
}

// =============================================================================
// Public
// =============================================================================

async fn list_organizations(
    Extension(state): Extension<AppState>,
    Query(query): Query<OrganizationListQuery>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Organization>> {
    ok(activities::list_organizations(query, page, &state.deps).await?)
}

async fn get_organization(
    Extension(state): Extension<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<OrganizationId>,
) -> ApiResult<OrganizationDetail> {
    ok(activities::get_organization(id, viewer.as_ref(), &state.deps).await?)
}

async fn add_favorite(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<OrganizationId>,
) -> ApiResult<()> {
    ok(activities::add_favorite(id, &user, &state.deps).await?)
}

async fn remove_favorite(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<OrganizationId>,
) -> ApiResult<()> {
    ok(activities::remove_favorite(id, &user, &state.deps).await?)
}

async fn my_favorites(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Organization>> {
    ok(activities::my_favorites(page, &user, &state.deps).await?)
}

// =============================================================================
// Owner
// =============================================================================

async fn create_organization(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(input): Json<CreateOrganizationInput>,
) -> CreatedResult<OrganizationWorkspace> {
    created(activities::create_organization(input, &user, &state.deps).await?)
}

async fn get_mine(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<OrganizationWorkspace> {
    ok(activities::get_my_organization(&user, &state.deps).await?)
}

async fn update_mine(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(input): Json<UpdateOrganizationInput>,
) -> ApiResult<OrganizationWorkspace> {
    ok(activities::update_my_organization(input, &user, &state.deps).await?)
}

async fn submit(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<OrganizationWorkspace> {
    ok(activities::submit_for_review(&user, &state.deps).await?)
}

async fn list_bank_accounts(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<BankAccount>> {
    ok(activities::list_bank_accounts(&user, &state.deps).await?)
}

async fn add_bank_account(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(input): Json<CreateBankAccountInput>,
) -> CreatedResult<BankAccount> {
    created(activities::add_bank_account(input, &user, &state.deps).await?)
}

async fn set_primary_bank_account(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<BankAccountId>,
) -> ApiResult<BankAccount> {
    ok(activities::set_primary_bank_account(id, &user, &state.deps).await?)
}

async fn delete_bank_account(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<BankAccountId>,
) -> ApiResult<()> {
    ok(activities::delete_bank_account(id, &user, &state.deps).await?)
}

async fn list_contacts(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<OrganizationContact>> {
    ok(activities::list_contacts(&user, &state.deps).await?)
}

async fn add_contact(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(input): Json<CreateContactInput>,
) -> CreatedResult<OrganizationContact> {
    created(activities::add_contact(input, &user, &state.deps).await?)
}

async fn delete_contact(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<ContactId>,
) -> ApiResult<()> {
    ok(activities::delete_contact(id, &user, &state.deps).await?)
}

async fn list_documents(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<OrganizationDocument>> {
    ok(activities::list_documents(&user, &state.deps).await?)
}

async fn add_document(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(input): Json<CreateDocumentInput>,
) -> CreatedResult<OrganizationDocument> {
    created(activities::add_document(input, &user, &state.deps).await?)
}

async fn delete_document(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<DocumentId>,
) -> ApiResult<()> {
    ok(activities::delete_document(id, &user, &state.deps).await?)
}

// =============================================================================
// Admin
// =============================================================================

async fn admin_list(
    Extension(state): Extension<AppState>,
    AdminUser(admin_user): AdminUser,
    Query(query): Query<AdminOrganizationQuery>,
    Query(page): Query<PageParams>,
) -> ApiResult<Paged<Organization>> {
    ok(admin::list_organizations(query, page, &admin_user, &state.deps).await?)
}

async fn admin_get(
    Extension(state): Extension<AppState>,
    AdminUser(admin_user): AdminUser,
    Path(id): Path<OrganizationId>,
) -> ApiResult<OrganizationWorkspace> {
    ok(admin::get_organization(id, &admin_user, &state.deps).await?)
}

async fn admin_verify(
    Extension(state): Extension<AppState>,
    AdminUser(admin_user): AdminUser,
    meta: RequestMeta,
    Path(id): Path<OrganizationId>,
) -> ApiResult<OrganizationWorkspace> {
    ok(admin::verify_organization(id, &admin_user, &meta, &state.deps).await?)
}

async fn admin_reject(
    Extension(state): Extension<AppState>,
    AdminUser(admin_user): AdminUser,
    meta: RequestMeta,
    Path(id): Path<OrganizationId>,
    Json(input): Json<RejectOrganizationInput>,
) -> ApiResult<OrganizationWorkspace> {
    ok(admin::reject_organization(id, input, &admin_user, &meta, &state.deps).await?)
}

async fn admin_featured(
    Extension(state): Extension<AppState>,
    AdminUser(admin_user): AdminUser,
    meta: RequestMeta,
    Path(id): Path<OrganizationId>,
    Json(input): Json<FeaturedInput>,
) -> ApiResult<Organization> {
    ok(admin::set_featured(id, input, &admin_user, &meta, &state.deps).await?)
}
