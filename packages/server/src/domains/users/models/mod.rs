pub mod preference;

pub use preference::{DonationVisibility, PreferenceChanges, UserPreference};
