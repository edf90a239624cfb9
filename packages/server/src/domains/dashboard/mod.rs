//! Admin dashboard - platform-wide counters

pub mod activities;
pub mod routes;
