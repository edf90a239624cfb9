pub mod admin;
pub mod profile;
pub mod public;
pub mod resources;
pub mod views;

pub use profile::{
    create_organization, get_my_organization, require_own_organization, submit_for_review,
    update_my_organization,
};
pub use public::{add_favorite, get_organization, list_organizations, my_favorites, remove_favorite};
pub use resources::*;
