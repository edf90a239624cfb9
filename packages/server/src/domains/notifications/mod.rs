//! Notifications domain - in-app messages for donors, foundations and admins

pub mod activities;
pub mod models;
pub mod routes;

pub use activities::notify;
pub use models::{Notification, NotificationType};
