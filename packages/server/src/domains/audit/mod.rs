//! Audit domain - append-only trail of administrative and security events

pub mod activities;
pub mod models;
pub mod routes;

pub use activities::record;
pub use models::{AuditAction, AuditEntry, AuditLog};
