pub mod application;
pub mod document;

pub use application::{
    Application, ApplicationChanges, ApplicationStatus, CityCount, NewApplication,
};
pub use document::{ApplicationDocument, NewApplicationDocument};
