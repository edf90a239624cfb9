pub mod campaign;
pub mod category;
pub mod follower;
pub mod image;
pub mod update;

pub use campaign::{
    Campaign, CampaignChanges, CampaignSort, CampaignStatus, NewCampaign, PublicCampaignFilter,
};
pub use category::{CampaignCategory, Category, CategoryChanges};
pub use follower::{CampaignFollower, FollowerTopic};
pub use image::{CampaignImage, NewCampaignImage};
pub use update::{CampaignUpdate, NewCampaignUpdate};
