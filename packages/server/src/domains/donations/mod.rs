//! Donations domain - card payments, receipts, refunds, bank transfers and
//! recurring plans

pub mod activities;
pub mod data;
pub mod models;
pub mod routes;

pub use models::{Donation, DonationStatus};
