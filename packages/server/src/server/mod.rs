// HTTP server setup (Axum)
pub mod app;
pub mod extractors;
pub mod middleware;
pub mod routes;

pub use app::*;
