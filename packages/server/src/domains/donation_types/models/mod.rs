pub mod donation_type;

pub use donation_type::DonationType;
