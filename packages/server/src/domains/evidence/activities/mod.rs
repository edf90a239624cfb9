pub mod deadlines;
pub mod review;
pub mod upload;

pub use deadlines::*;
pub use review::*;
pub use upload::*;
