//! Applications domain - aid requests from beneficiaries, routed by admins
//! to organizations

pub mod activities;
pub mod data;
pub mod models;
pub mod routes;

pub use models::{Application, ApplicationStatus};
