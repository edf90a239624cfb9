use super::{AdminCapability, AuthError};
use crate::common::entity_ids::UserId;
use tracing::warn;

/// Entry point for authorization checks
pub struct Actor {
    actor_id: UserId,
    is_admin: bool,
}

impl Actor {
    /// `is_admin` comes from the verified access token's role claim.
    pub fn new(actor_id: UserId, is_admin: bool) -> Self {
        Self { actor_id, is_admin }
    }

    /// Specify what capability the actor needs
    pub fn can(self, capability: AdminCapability) -> CapabilityBuilder {
        CapabilityBuilder {
            actor_id: self.actor_id,
            is_admin: self.is_admin,
            capability,
        }
    }

    /// Passes for the owner of a resource and for admins.
    pub fn require_owner(&self, owner_id: UserId) -> Result<(), AuthError> {
        if self.actor_id == owner_id || self.is_admin {
            return Ok(());
        }
        Err(AuthError::PermissionDenied(
            "You do not own this resource".to_string(),
        ))
    }

    /// Passes only for the owner. Admins are refused too.
    pub fn require_strict_owner(&self, owner_id: UserId) -> Result<(), AuthError> {
        if self.actor_id == owner_id {
            return Ok(());
        }
        Err(AuthError::PermissionDenied(
            "Only the owner can perform this action".to_string(),
        ))
    }
}

/// Builder after specifying capability
pub struct CapabilityBuilder {
    actor_id: UserId,
    is_admin: bool,
    capability: AdminCapability,
}

impl CapabilityBuilder {
    /// Perform the authorization check
    pub async fn check<D>(self, deps: &D) -> Result<(), AuthError>
    where
        D: HasAuthContext,
    {
        check_admin_permission(self.actor_id, self.is_admin, self.capability, deps).await
    }
}

/// Trait for dependencies that can perform auth checks
pub trait HasAuthContext: Send + Sync {
    /// E-mail addresses promoted to ADMIN at registration
    fn admin_emails(&self) -> &[String];
}

async fn check_admin_permission<D>(
    actor_id: UserId,
    is_admin: bool,
    capability: AdminCapability,
    _deps: &D,
) -> Result<(), AuthError>
where
    D: HasAuthContext,
{
    if capability.requires_admin() && !is_admin {
        warn!(actor_id = %actor_id, capability = ?capability, "Admin capability denied");
        return Err(AuthError::AdminRequired);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestDeps {
        admin_emails: Vec<String>,
    }

    impl HasAuthContext for TestDeps {
        fn admin_emails(&self) -> &[String] {
            &self.admin_emails
        }
    }

    #[tokio::test]
    async fn admin_passes_capability_check() {
        let deps = TestDeps {
            admin_emails: vec!["admin@seffafbagis.org".to_string()],
        };

        let result = Actor::new(UserId::new(), true)
            .can(AdminCapability::ApproveCampaigns)
            .check(&deps)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn non_admin_is_rejected() {
        let deps = TestDeps {
            admin_emails: vec![],
        };

        let result = Actor::new(UserId::new(), false)
            .can(AdminCapability::ReviewEvidence)
            .check(&deps)
            .await;

        assert!(matches!(result, Err(AuthError::AdminRequired)));
    }

    #[test]
    fn owner_check_admits_owner_and_admin_only() {
        let owner = UserId::new();
        assert!(Actor::new(owner, false).require_owner(owner).is_ok());
        assert!(Actor::new(UserId::new(), true).require_owner(owner).is_ok());
        assert!(matches!(
            Actor::new(UserId::new(), false).require_owner(owner),
            Err(AuthError::PermissionDenied(_))
        ));
    }

    #[test]
    fn strict_owner_check_refuses_admins() {
        let owner = UserId::new();
        assert!(Actor::new(UserId::new(), true)
            .require_strict_owner(owner)
            .is_err());
    }
}
