use crate::common::AuthUser;
use crate::domains::auth::JwtService;
use axum::{middleware::Next, response::Response};
use std::sync::Arc;
use tracing::debug;

/// JWT authentication middleware
///
/// Extracts the access token from the Authorization header, verifies it, and
/// adds `AuthUser` to request extensions. Without a valid token the request
/// continues anonymously; the `AuthUser` extractor rejects it where needed.
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(user) = extract_auth_user(&request, &jwt_service) {
        debug!(user_id = %user.user_id, role = %user.role, "Authenticated request");
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}

/// Extract and verify an access token from the request
fn extract_auth_user(
    request: &axum::http::Request<axum::body::Body>,
    jwt_service: &JwtService,
) -> Option<AuthUser> {
    let auth_header = request.headers().get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;

    // Handle both "Bearer <token>" and raw token
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str);

    let claims = jwt_service.verify_access_token(token).ok()?;

    Some(AuthUser {
        user_id: claims.user_id(),
        email: claims.email,
        role: claims.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{UserId, UserRole};
    use chrono::Duration;

    fn service() -> JwtService {
        JwtService::new("test_secret", "test_issuer".to_string())
    }

    fn request_with(header: Option<String>) -> axum::http::Request<axum::body::Body> {
        let mut builder = axum::http::Request::builder();
        if let Some(value) = header {
            builder = builder.header("authorization", value);
        }
        builder.body(axum::body::Body::empty()).unwrap()
    }

    #[test]
    fn test_extract_token_with_bearer() {
        let jwt_service = service();
        let user_id = UserId::new();
        let token = jwt_service
            .create_access_token(user_id, "vakif@example.org", UserRole::Foundation, Duration::minutes(15))
            .unwrap();

        let auth_user = extract_auth_user(&request_with(Some(format!("Bearer {}", token))), &jwt_service)
            .unwrap();
        assert_eq!(auth_user.user_id, user_id);
        assert_eq!(auth_user.role, UserRole::Foundation);
        assert_eq!(auth_user.email, "vakif@example.org");
    }

    #[test]
    fn test_extract_token_without_bearer() {
        let jwt_service = service();
        let user_id = UserId::new();
        let token = jwt_service
            .create_access_token(user_id, "a@b.co", UserRole::Donor, Duration::minutes(15))
            .unwrap();

        let auth_user = extract_auth_user(&request_with(Some(token)), &jwt_service);
        assert_eq!(auth_user.map(|u| u.user_id), Some(user_id));
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let jwt_service = service();
        let token = jwt_service
            .create_refresh_token(UserId::new(), "a@b.co", UserRole::Donor, Duration::days(7))
            .unwrap();

        assert!(extract_auth_user(&request_with(Some(format!("Bearer {}", token))), &jwt_service).is_none());
    }

    #[test]
    fn test_no_auth_header() {
        assert!(extract_auth_user(&request_with(None), &service()).is_none());
    }

    #[test]
    fn test_invalid_token() {
        let request = request_with(Some("Bearer invalid_token".to_string()));
        assert!(extract_auth_user(&request, &service()).is_none());
    }
}
