//! Campaigns domain - fundraising campaigns, their state machine,
//! categories and followers

pub mod activities;
pub mod data;
pub mod models;
pub mod routes;

pub use models::{Campaign, CampaignStatus};
