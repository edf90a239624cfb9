pub mod admin;
pub mod content;
pub mod lifecycle;
pub mod manage;
pub mod public;
pub mod views;

pub use lifecycle::review_due_campaigns;
pub use manage::*;
pub use public::*;
