//! Transparency domain - per-organization trust score driven by evidence,
//! campaign outcomes and upheld reports

pub mod activities;
pub mod calculator;
pub mod models;
pub mod routes;

pub use calculator::ScoreEvent;
pub use models::TransparencyScore;
