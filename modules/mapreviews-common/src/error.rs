use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapReviewsError {
    #[error("Configuration error: {0}")]
    Config(String),
}
