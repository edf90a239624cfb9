//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod payment;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deps::{ServerDeps, TokenPolicy};
pub use payment::SimulatedPaymentGateway;
pub use test_dependencies::{MockPaymentGateway, TestDependencies};
pub use traits::*;
