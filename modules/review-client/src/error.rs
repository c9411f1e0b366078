use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReviewApiError>;

#[derive(Debug, Error)]
pub enum ReviewApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ReviewApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ReviewApiError::Parse(err.to_string())
        } else {
            ReviewApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ReviewApiError {
    fn from(err: serde_json::Error) -> Self {
        ReviewApiError::Parse(err.to_string())
    }
}
