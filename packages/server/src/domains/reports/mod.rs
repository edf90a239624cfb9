//! Reports domain - user complaints about campaigns and organizations

pub mod activities;
pub mod data;
pub mod models;
pub mod routes;

pub use models::{Report, ReportStatus};
