//! API error type shared by every route.
//!
//! Activities return `anyhow::Result` and raise an `ApiError` when the caller
//! did something wrong. Routes convert the `anyhow::Error` back with `?`,
//! which recovers the `ApiError` (or maps well-known database failures) and
//! turns everything else into an opaque 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use super::auth::AuthError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    PaymentFailed(String),

    #[error("{0}")]
    TooManyRequests(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// `"<entity> not found"`
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{} not found", entity))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PaymentFailed(_) => StatusCode::PAYMENT_REQUIRED,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::PaymentFailed(_) => "PAYMENT_FAILED",
            ApiError::TooManyRequests(_) => "TOO_MANY_REQUESTS",
            ApiError::Unavailable(_) => "SERVICE_UNAVAILABLE",
            ApiError::Internal => "INTERNAL_ERROR",
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationRequired => {
                ApiError::Unauthorized("Authentication required".to_string())
            }
            AuthError::InvalidToken => ApiError::Unauthorized(err.to_string()),
            AuthError::PermissionDenied(reason) => ApiError::Forbidden(reason),
            AuthError::AdminRequired => ApiError::Forbidden(err.to_string()),
            AuthError::DatabaseError(db) => ApiError::from(anyhow::Error::from(db)),
            AuthError::InternalError(inner) => ApiError::from(inner),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ApiError>() {
            Ok(api) => return api,
            Err(err) => err,
        };
        let err = match err.downcast::<AuthError>() {
            Ok(auth) => return auth.into(),
            Err(err) => err,
        };

        if let Some(db) = err.downcast_ref::<sqlx::Error>() {
            match db {
                sqlx::Error::RowNotFound => {
                    return ApiError::NotFound("Resource not found".to_string())
                }
                sqlx::Error::Database(e) if e.is_unique_violation() => {
                    return ApiError::Conflict("Resource already exists".to_string())
                }
                _ => {}
            }
        }

        error!(error = ?err, "Unhandled error while serving request");
        ApiError::Internal
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    code: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let field = match &self {
            ApiError::Validation { field, .. } => Some(field.as_str()),
            _ => None,
        };
        let body = ErrorBody {
            success: false,
            error: ErrorDetail {
                code: self.code(),
                message: self.to_string(),
                field,
            },
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_survives_a_trip_through_anyhow() {
        let err: anyhow::Error = ApiError::validation("amount", "Amount too low").into();
        match ApiError::from(err) {
            ApiError::Validation { field, message } => {
                assert_eq!(field, "amount");
                assert_eq!(message, "Amount too low");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn context_does_not_hide_the_api_error() {
        use anyhow::Context;
        let result: anyhow::Result<()> =
            Err(ApiError::not_found("Campaign")).context("loading campaign");
        let api = ApiError::from(result.unwrap_err());
        assert_eq!(api.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err = anyhow::Error::from(sqlx::Error::RowNotFound);
        assert_eq!(ApiError::from(err).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn auth_errors_map_to_401_and_403() {
        assert_eq!(
            ApiError::from(AuthError::AuthenticationRequired).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::AdminRequired).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn maintenance_refusal_is_a_503() {
        let api = ApiError::Unavailable("Bakımdayız".to_string());
        assert_eq!(api.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api.code(), "SERVICE_UNAVAILABLE");
    }

    #[test]
    fn unknown_errors_become_opaque_internal_errors() {
        let api = ApiError::from(anyhow::anyhow!("connection reset by peer"));
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.to_string(), "Internal server error");
    }
}
