/// Authorization helpers.
///
/// ```rust,ignore
/// use crate::common::auth::{Actor, AdminCapability};
///
/// user.actor()
///     .can(AdminCapability::ApproveCampaigns)
///     .check(deps)
///     .await?;
///
/// user.actor().require_owner(organization.user_id)?;
/// ```
mod builder;
mod capability;
mod errors;
mod role;
mod user;

pub use builder::{Actor, CapabilityBuilder, HasAuthContext};
pub use capability::AdminCapability;
pub use errors::AuthError;
pub use role::UserRole;
pub use user::{AuthUser, RequestMeta};
