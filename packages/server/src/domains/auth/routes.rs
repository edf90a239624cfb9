use axum::extract::Extension;
use axum::routing::post;
use axum::{Json, Router};

use crate::common::{created, ok, ok_with_message, ApiResult, AuthUser, CreatedResult, RequestMeta};
use crate::domains::auth::activities;
use crate::domains::auth::data::{
    AuthTokens, ChangePasswordInput, ForgotPasswordInput, LoginInput, RefreshTokenInput,
    RegisterInput, ResetPasswordInput, TokenInput, UserData,
};
use crate::server::app::AppState;

pub fn router() -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/verify-email", post(verify_email))
        .route("/auth/resend-verification", post(resend_verification))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/change-password", post(change_password))
}

async fn register(
    Extension(state): Extension<AppState>,
    meta: RequestMeta,
    Json(input): Json<RegisterInput>,
) -> CreatedResult<AuthTokens> {
    created(activities::register(input, &meta, &state.deps).await?)
}

async fn login(
    Extension(state): Extension<AppState>,
    meta: RequestMeta,
    Json(input): Json<LoginInput>,
) -> ApiResult<AuthTokens> {
    ok(activities::login(input, &meta, &state.deps).await?)
}

async fn refresh(
    Extension(state): Extension<AppState>,
    meta: RequestMeta,
    Json(input): Json<RefreshTokenInput>,
) -> ApiResult<AuthTokens> {
    ok(activities::refresh(&input.refresh_token, &meta, &state.deps).await?)
}

async fn logout(
    Extension(state): Extension<AppState>,
    Json(input): Json<RefreshTokenInput>,
) -> ApiResult<()> {
    activities::logout(&input.refresh_token, &state.deps).await?;
    ok_with_message((), "Logged out")
}

async fn verify_email(
    Extension(state): Extension<AppState>,
    Json(input): Json<TokenInput>,
) -> ApiResult<UserData> {
    ok_with_message(
        activities::verify_email(&input.token, &state.deps).await?,
        "E-mail verified",
    )
}

async fn resend_verification(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<()> {
    activities::resend_verification(&user, &state.deps).await?;
    ok_with_message((), "Verification e-mail sent")
}

async fn forgot_password(
    Extension(state): Extension<AppState>,
    Json(input): Json<ForgotPasswordInput>,
) -> ApiResult<()> {
    activities::forgot_password(&input.email, &state.deps).await?;
    ok_with_message(
        (),
        "If the address is registered, password reset instructions have been sent",
    )
}

async fn reset_password(
    Extension(state): Extension<AppState>,
    meta: RequestMeta,
    Json(input): Json<ResetPasswordInput>,
) -> ApiResult<()> {
    activities::reset_password(input, &meta, &state.deps).await?;
    ok_with_message((), "Password has been reset")
}

async fn change_password(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    meta: RequestMeta,
    Json(input): Json<ChangePasswordInput>,
) -> ApiResult<()> {
    activities::change_password(input, &user, &meta, &state.deps).await?;
    ok_with_message((), "Password changed")
}
