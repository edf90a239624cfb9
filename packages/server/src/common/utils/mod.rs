pub mod masking;
pub mod receipt_number;
pub mod reference_code;
pub mod slug;
pub mod token;

pub use masking::*;
pub use slug::slugify;
pub use token::{generate_token, hash_token};
