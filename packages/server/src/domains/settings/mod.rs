//! Settings domain - runtime-tunable platform values

pub mod activities;
pub mod models;
pub mod routes;

pub use activities::{get_bool, get_decimal, get_i64};
