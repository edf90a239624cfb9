pub mod admin;
pub mod preferences;
pub mod profile;

pub use admin::{change_role, change_status, get_user, list_users, unlock_user, user_login_history};
pub use preferences::{get_preferences, update_preferences};
pub use profile::{get_me, my_login_history, update_me};
