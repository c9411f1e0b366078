pub mod error;
pub mod query;
pub mod types;

pub use error::{Result, ReviewApiError};
pub use query::{reviews_url, urlify_bounds, urlify_query};
pub use types::{ReviewSearchResponse, SearchResults};

use std::time::Duration;

use mapreviews_common::MapBounds;
use tracing::debug;

pub struct ReviewClient {
    client: reqwest::Client,
    base_url: String,
}

impl ReviewClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search reviews for a restaurant name inside a viewport. One GET, no retries.
    pub async fn search(&self, name: &str, bounds: &MapBounds) -> Result<ReviewSearchResponse> {
        let url = reviews_url(&self.base_url, name, bounds);
        debug!(name, url = url.as_str(), "Searching reviews");

        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ReviewApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        let parsed: ReviewSearchResponse = serde_json::from_str(&body)?;
        debug!(
            name,
            results = parsed.search.as_ref().map(|s| s.results.len()).unwrap_or(0),
            "Review search complete"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = ReviewClient::new("https://reviews.example.com/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "https://reviews.example.com");
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let client = ReviewClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let bounds = MapBounds {
            north_latitude: 1.0,
            east_longitude: 1.0,
            south_latitude: 0.0,
            west_longitude: 0.0,
        };
        let err = client.search("Nowhere", &bounds).await.unwrap_err();
        assert!(matches!(err, ReviewApiError::Network(_)));
    }
}
