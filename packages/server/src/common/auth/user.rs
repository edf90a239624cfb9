use serde::Serialize;

use super::{Actor, UserRole};
use crate::common::entity_ids::UserId;

/// Authenticated caller, taken from a verified access token
#[derive(Clone, Debug, Serialize)]
pub struct AuthUser {
    pub user_id: UserId,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.is_admin())
    }
}

/// Where a request came from, recorded in audit and login history
#[derive(Clone, Debug, Default)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
