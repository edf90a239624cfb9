/// Administrative capabilities on the donation platform.
///
/// Every capability currently maps to the ADMIN role; the enum exists so call
/// sites say what they are about to do, which is what the audit trail records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCapability {
    /// Change user status and role, unlock accounts
    ManageUsers,

    /// Verify or reject organizations
    VerifyOrganizations,

    /// Approve, reject and flag campaigns
    ApproveCampaigns,

    /// Approve or reject spending evidence
    ReviewEvidence,

    /// Assign and resolve abuse reports
    HandleReports,

    /// Create, update and delete system settings
    ManageSettings,

    /// Match incoming bank transfers and process refunds
    ManagePayments,

    /// Review beneficiary applications and route them to organizations
    ReviewApplications,

    /// Read the audit trail and dashboard
    ViewAuditLogs,

    /// Full admin access to all operations
    FullAdmin,
}

impl AdminCapability {
    pub fn requires_admin(&self) -> bool {
        true
    }
}
