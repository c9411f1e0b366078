pub mod config;
pub mod error;
pub mod messages;
pub mod types;

pub use config::Config;
pub use error::MapReviewsError;
pub use messages::*;
pub use types::*;
