use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::error::ApiError;

/// Success envelope: `{ "success": true, "data": ..., "message"? }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;
pub type CreatedResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        success: true,
        data,
        message: None,
    }))
}

pub fn ok_with_message<T>(data: T, message: impl Into<String>) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        success: true,
        data,
        message: Some(message.into()),
    }))
}

pub fn created<T>(data: T) -> CreatedResult<T> {
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            success: true,
            data,
            message: None,
        }),
    ))
}
