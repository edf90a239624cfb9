// Business domains
pub mod applications;
pub mod audit;
pub mod auth;
pub mod campaigns;
pub mod dashboard;
pub mod donation_types;
pub mod donations;
pub mod evidence;
pub mod notifications;
pub mod organizations;
pub mod reports;
pub mod settings;
pub mod transparency;
pub mod users;
