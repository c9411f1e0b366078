use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

pub type Result<T> = std::result::Result<T, PageSourceError>;

#[derive(Debug, Error)]
pub enum PageSourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Render API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for PageSourceError {
    fn from(err: reqwest::Error) -> Self {
        PageSourceError::Network(err.to_string())
    }
}

/// Rendered state of the map page at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
}

#[async_trait]
pub trait PageSource: Send + Sync {
    /// Capture the page as it currently renders.
    async fn snapshot(&self) -> Result<PageSnapshot>;
    fn name(&self) -> &str;
}

// --- Browserless /content ---

/// Renders the map page through a Browserless instance on every snapshot.
pub struct BrowserlessPageSource {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    page_url: String,
}

impl BrowserlessPageSource {
    pub fn new(base_url: &str, token: Option<&str>, page_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            page_url: page_url.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }
}

#[async_trait]
impl PageSource for BrowserlessPageSource {
    async fn snapshot(&self) -> Result<PageSnapshot> {
        let body = serde_json::json!({ "url": self.page_url });

        let resp = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PageSourceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let html = resp.text().await?;
        debug!(url = self.page_url.as_str(), bytes = html.len(), "Rendered page");
        Ok(PageSnapshot {
            url: self.page_url.clone(),
            html,
        })
    }

    fn name(&self) -> &str {
        "browserless"
    }
}

// --- Saved snapshot ---

/// Re-reads a saved HTML file on every snapshot, reporting it under a fixed URL.
pub struct FilePageSource {
    path: PathBuf,
    page_url: String,
}

impl FilePageSource {
    pub fn new(path: impl Into<PathBuf>, page_url: &str) -> Self {
        Self {
            path: path.into(),
            page_url: page_url.to_string(),
        }
    }
}

#[async_trait]
impl PageSource for FilePageSource {
    async fn snapshot(&self) -> Result<PageSnapshot> {
        let html = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| PageSourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        Ok(PageSnapshot {
            url: self.page_url.clone(),
            html,
        })
    }

    fn name(&self) -> &str {
        "file"
    }
}
