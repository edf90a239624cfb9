//! Typed ID definitions for all domain entities.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

pub struct User;
pub struct Organization;
pub struct OrganizationContact;
pub struct OrganizationBankAccount;
pub struct OrganizationDocument;
pub struct Campaign;
pub struct Category;
pub struct Donation;
pub struct DonationReceipt;
pub struct BankTransferReference;
pub struct RecurringDonation;
pub struct Evidence;
pub struct EvidenceDocument;
pub struct Report;
pub struct Notification;
pub struct AuditLog;
pub struct SystemSetting;
pub struct Application;
pub struct ApplicationDocument;
pub struct CampaignUpdate;
pub struct CampaignImage;
pub struct DonationType;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type UserId = Id<User>;
pub type OrganizationId = Id<Organization>;
pub type ContactId = Id<OrganizationContact>;
pub type BankAccountId = Id<OrganizationBankAccount>;
pub type DocumentId = Id<OrganizationDocument>;
pub type CampaignId = Id<Campaign>;
pub type CategoryId = Id<Category>;
pub type DonationId = Id<Donation>;
pub type ReceiptId = Id<DonationReceipt>;
pub type BankTransferId = Id<BankTransferReference>;
pub type RecurringDonationId = Id<RecurringDonation>;
pub type EvidenceId = Id<Evidence>;
pub type EvidenceDocumentId = Id<EvidenceDocument>;
pub type ReportId = Id<Report>;
pub type NotificationId = Id<Notification>;
pub type AuditLogId = Id<AuditLog>;
pub type SettingId = Id<SystemSetting>;
pub type ApplicationId = Id<Application>;
pub type ApplicationDocumentId = Id<ApplicationDocument>;
pub type CampaignUpdateId = Id<CampaignUpdate>;
pub type CampaignImageId = Id<CampaignImage>;
pub type DonationTypeId = Id<DonationType>;
