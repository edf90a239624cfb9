pub mod login_history;
pub mod one_time_token;
pub mod profile;
pub mod refresh_token;
pub mod user;

pub use login_history::LoginHistory;
pub use one_time_token::{OneTimeToken, OneTimeTokenKind};
pub use profile::{UpdateProfile, UserProfile};
pub use refresh_token::RefreshToken;
pub use user::{User, UserFilter, UserStatus};
