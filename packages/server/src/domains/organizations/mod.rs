//! Organizations domain - foundations and associations that run campaigns,
//! with their verification material and admin review

pub mod activities;
pub mod data;
pub mod models;
pub mod routes;

pub use models::{Organization, OrganizationType, VerificationStatus};
