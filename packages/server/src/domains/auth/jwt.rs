use anyhow::Result;
use chrono::Duration;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{AuthError, UserId, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT Claims - data stored in the token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // Subject (user_id as string)
    pub user_id: Uuid,         // User UUID
    pub email: String,         // E-mail at issue time
    pub role: UserRole,        // Role at issue time
    pub token_type: TokenType, // access | refresh
    pub exp: i64,              // Expiration timestamp
    pub iat: i64,              // Issued at timestamp
    pub iss: String,           // Issuer
    pub jti: String,           // JWT ID (unique token identifier)
}

impl Claims {
    pub fn user_id(&self) -> UserId {
        UserId::from_uuid(self.user_id)
    }
}

/// JWT Service - creates and verifies JWT tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    /// Create new JWT service with secret and issuer
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    pub fn create_access_token(
        &self,
        user_id: UserId,
        email: &str,
        role: UserRole,
        ttl: Duration,
    ) -> Result<String> {
        self.create_token(user_id, email, role, TokenType::Access, ttl)
    }

    /// Refresh tokens carry a fresh `jti` so every rotation hashes differently.
    pub fn create_refresh_token(
        &self,
        user_id: UserId,
        email: &str,
        role: UserRole,
        ttl: Duration,
    ) -> Result<String> {
        self.create_token(user_id, email, role, TokenType::Refresh, ttl)
    }

    fn create_token(
        &self,
        user_id: UserId,
        email: &str,
        role: UserRole,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + ttl;

        let claims = Claims {
            sub: user_id.to_string(),
            user_id: user_id.into_uuid(),
            email: email.to_string(),
            role,
            token_type,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode a JWT token
    ///
    /// Returns claims if token is valid and not expired
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }

    /// Like `verify_token`, but refresh tokens are refused.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        match self.verify_token(token) {
            Ok(claims) if claims.token_type == TokenType::Access => Ok(claims),
            _ => Err(AuthError::InvalidToken),
        }
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, AuthError> {
        match self.verify_token(token) {
            Ok(claims) if claims.token_type == TokenType::Refresh => Ok(claims),
            _ => Err(AuthError::InvalidToken),
        }
    }
}
