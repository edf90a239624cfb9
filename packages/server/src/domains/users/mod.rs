//! Users domain - profile self-service and admin account management

pub mod activities;
pub mod data;
pub mod models;
pub mod routes;
