// Common types and utilities shared across the application

pub mod auth;
pub mod entity_ids;
pub mod error;
pub mod id;
pub mod pagination;
pub mod response;
pub mod utils;
pub mod validation;

pub use auth::{Actor, AdminCapability, AuthError, AuthUser, HasAuthContext, RequestMeta, UserRole};
pub use entity_ids::*;
pub use error::ApiError;
pub use id::Id;
pub use pagination::{PageParams, Paged};
pub use response::{created, ok, ok_with_message, ApiResponse, ApiResult, CreatedResult};
