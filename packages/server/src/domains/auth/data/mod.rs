use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{UserId, UserRole};
use crate::domains::auth::models::{User, UserProfile, UserStatus};

/// Public view of an account (never includes credentials)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    pub id: UserId,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub email_verified: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub city: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserData {
    pub fn new(user: User, profile: Option<UserProfile>) -> Self {
        let profile = profile.as_ref();
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            status: user.status,
            email_verified: user.email_verified,
            first_name: profile.map(|p| p.first_name.clone()),
            last_name: profile.map(|p| p.last_name.clone()),
            phone: profile.and_then(|p| p.phone.clone()),
            avatar_url: profile.and_then(|p| p.avatar_url.clone()),
            bio: profile.and_then(|p| p.bio.clone()),
            city: profile.and_then(|p| p.city.clone()),
            last_login_at: user.last_login_at,
            locked_until: user.locked_until,
            created_at: user.created_at,
        }
    }
}

/// Token pair returned by register, login and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub user: UserData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenInput {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenInput {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordInput {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordInput {
    pub token: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}
