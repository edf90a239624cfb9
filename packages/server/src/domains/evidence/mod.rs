//! Evidence domain - proof of spending for completed campaigns

pub mod activities;
pub mod data;
pub mod models;
pub mod routes;

pub use models::{Evidence, EvidenceStatus};
