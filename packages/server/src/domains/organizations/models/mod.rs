pub mod bank_account;
pub mod contact;
pub mod document;
pub mod favorite;
pub mod organization;

pub use bank_account::BankAccount;
pub use contact::OrganizationContact;
pub use document::OrganizationDocument;
pub use favorite::FavoriteOrganization;
pub use organization::{
    NewOrganization, Organization, OrganizationChanges, OrganizationType, VerificationStatus,
};
