//! Request extractors for the caller's identity and origin.
//!
//! `AuthUser` is populated by `jwt_auth_middleware`; these extractors only
//! read request extensions and never touch the database.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;

use crate::common::{ApiError, AuthError, AuthUser, RequestMeta};
use crate::server::middleware::ClientIp;

/// Longest user agent stored with audit and login records
const MAX_USER_AGENT_LENGTH: usize = 500;

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AuthError::AuthenticationRequired.into())
    }
}

/// Caller when a token was sent, `None` for anonymous requests.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(parts.extensions.get::<AuthUser>().cloned()))
    }
}

/// Authenticated ADMIN. 401 without a token, 403 for other roles.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AuthError::AdminRequired.into());
        }
        Ok(AdminUser(user))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip_address = parts
            .extensions
            .get::<ClientIp>()
            .map(|ClientIp(ip)| ip.to_string());
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|ua| ua.chars().take(MAX_USER_AGENT_LENGTH).collect());
        Ok(RequestMeta {
            ip_address,
            user_agent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{UserId, UserRole};
    use axum::http::{Request, StatusCode};

    fn parts_with(user: Option<AuthUser>) -> Parts {
        let mut request = Request::builder()
            .header(USER_AGENT, "Mozilla/5.0")
            .body(())
            .unwrap();
        if let Some(user) = user {
            request.extensions_mut().insert(user);
        }
        request
            .extensions_mut()
            .insert(ClientIp("192.0.2.10".parse().unwrap()));
        request.into_parts().0
    }

    fn user(role: UserRole) -> AuthUser {
        AuthUser {
            user_id: UserId::new(),
            email: "user@example.com".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn missing_user_is_unauthorized() {
        let mut parts = parts_with(None);
        let err = AuthUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let MaybeAuthUser(viewer) = MaybeAuthUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(viewer.is_none());
    }

    #[tokio::test]
    async fn non_admins_are_forbidden() {
        let mut parts = parts_with(Some(user(UserRole::Foundation)));
        let err = AdminUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let mut parts = parts_with(Some(user(UserRole::Admin)));
        let AdminUser(admin) = AdminUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(admin.is_admin());
    }

    #[tokio::test]
    async fn request_meta_reads_ip_and_user_agent() {
        let mut parts = parts_with(None);
        let meta = RequestMeta::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(meta.ip_address.as_deref(), Some("192.0.2.10"));
        assert_eq!(meta.user_agent.as_deref(), Some("Mozilla/5.0"));
    }
}
