use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::MapReviewsError;

pub const DEFAULT_BROWSERLESS_URL: &str = "http://localhost:3000";
pub const DEFAULT_REVIEW_API_URL: &str = "https://tamland.zagat.com";

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Map search page to watch. Required to run, even with a saved snapshot,
    /// since the viewport is derived from it; `--url` may supply it instead.
    pub map_url: Option<String>,

    // Rendering
    pub browserless_url: String,
    pub browserless_token: Option<String>,

    // Review API
    pub review_api_url: String,
    pub review_timeout: Duration,

    // Polling
    pub poll_interval: Duration,
    pub max_concurrent_fetches: usize,
    pub max_tracked_restaurants: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            map_url: None,
            browserless_url: DEFAULT_BROWSERLESS_URL.to_string(),
            browserless_token: None,
            review_api_url: DEFAULT_REVIEW_API_URL.to_string(),
            review_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(3),
            max_concurrent_fetches: 8,
            max_tracked_restaurants: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, MapReviewsError> {
        let defaults = Self::default();
        let config = Self {
            map_url: optional_env("MAP_URL"),
            browserless_url: optional_env("BROWSERLESS_URL").unwrap_or(defaults.browserless_url),
            browserless_token: optional_env("BROWSERLESS_TOKEN"),
            review_api_url: optional_env("REVIEW_API_URL").unwrap_or(defaults.review_api_url),
            review_timeout: parse_env::<u64>("REVIEW_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.review_timeout),
            poll_interval: parse_env::<u64>("POLL_INTERVAL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            max_concurrent_fetches: parse_env("MAX_CONCURRENT_FETCHES")?
                .unwrap_or(defaults.max_concurrent_fetches),
            max_tracked_restaurants: parse_env("MAX_TRACKED_RESTAURANTS")?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MapReviewsError> {
        if self.poll_interval.is_zero() {
            return Err(MapReviewsError::Config(
                "POLL_INTERVAL_SECS must be greater than zero".into(),
            ));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(MapReviewsError::Config(
                "MAX_CONCURRENT_FETCHES must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Log effective settings with secrets masked.
    pub fn log_redacted(&self) {
        let token = if self.browserless_token.is_some() { "<redacted>" } else { "<unset>" };
        info!(
            map_url = self.map_url.as_deref().unwrap_or("<unset>"),
            browserless_url = self.browserless_url.as_str(),
            browserless_token = token,
            review_api_url = self.review_api_url.as_str(),
            review_timeout_secs = self.review_timeout.as_secs(),
            poll_interval_secs = self.poll_interval.as_secs(),
            max_concurrent_fetches = self.max_concurrent_fetches,
            max_tracked_restaurants = ?self.max_tracked_restaurants,
            "Loaded config"
        );
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>, MapReviewsError> {
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| MapReviewsError::Config(format!("{key} must be a number, got {raw:?}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_poll_every_three_seconds() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.review_api_url, DEFAULT_REVIEW_API_URL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_concurrency_rejected() {
        let config = Config {
            max_concurrent_fetches: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(MapReviewsError::Config(_))));
    }

    #[test]
    fn zero_interval_rejected() {
        let config = Config {
            poll_interval: Duration::ZERO,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
