pub mod login;
pub mod password;
pub mod register;
pub mod tokens;
pub mod verify_email;

pub use login::login;
pub use password::{change_password, forgot_password, reset_password};
pub use register::register;
pub use tokens::{logout, refresh};
pub use verify_email::{resend_verification, verify_email};
