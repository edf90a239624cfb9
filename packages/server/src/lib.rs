// Şeffaf Bağış - API Core
//
// Backend for a transparent donation platform: verified foundations run
// campaigns, donors give by card, bank transfer or recurring plans, and
// foundations prove their spending with evidence that drives a public
// transparency score.
//
// Each domain keeps SQL in models/, business rules in activities/ and HTTP
// in routes.rs.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
