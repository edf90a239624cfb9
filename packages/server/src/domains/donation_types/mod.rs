//! Donation types domain - the religious and general giving categories
//! (zakat, fitra, qurban, ...) a donor can pick from

pub mod activities;
pub mod models;
pub mod routes;

pub use models::DonationType;
