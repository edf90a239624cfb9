//! Auth domain - e-mail/password accounts, JWT sessions and one-time tokens
//!
//! Responsibilities:
//! - Registration and login with lockout after repeated failures
//! - Access/refresh JWT pairs with refresh rotation and reuse detection
//! - Password reset and e-mail verification via hashed single-use tokens

pub mod activities;
pub mod data;
pub mod jwt;
pub mod models;
pub mod password;
pub mod routes;

pub use data::{AuthTokens, UserData};
pub use jwt::{Claims, JwtService, TokenType};
pub use models::{User, UserProfile, UserStatus};
