//! Background-side handling of `fetchReviewMeta` requests.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info};

use mapreviews_common::{ExtensionRequest, MapBounds, Restaurant, ReviewResponse};
use review_client::{ReviewClient, ReviewSearchResponse};

#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Search reviews for a restaurant name inside a viewport.
    async fn search(&self, name: &str, bounds: &MapBounds) -> Result<ReviewSearchResponse>;
}

#[async_trait]
impl ReviewSource for ReviewClient {
    async fn search(&self, name: &str, bounds: &MapBounds) -> Result<ReviewSearchResponse> {
        Ok(ReviewClient::search(self, name, bounds).await?)
    }
}

pub struct ReviewFetcher {
    source: Arc<dyn ReviewSource>,
}

impl ReviewFetcher {
    pub fn new(source: Arc<dyn ReviewSource>) -> Self {
        Self { source }
    }

    /// Answer one request. Lookup misses come back as status replies;
    /// transport and decode failures are returned as errors.
    pub async fn handle(&self, request: ExtensionRequest) -> Result<ReviewResponse> {
        match request {
            ExtensionRequest::FetchReviewMeta { restaurant } => self.fetch_review_meta(restaurant).await,
        }
    }

    async fn fetch_review_meta(&self, restaurant: Restaurant) -> Result<ReviewResponse> {
        let search = self
            .source
            .search(&restaurant.name, &restaurant.map_bounds)
            .await
            .with_context(|| format!("review search failed for {:?}", restaurant.name))?;

        let response = reconcile(&restaurant, &search)?;
        info!(name = restaurant.name.as_str(), status = response.status(), "Review lookup finished");
        Ok(response)
    }
}

/// Decide the reply for a search result. First matching rule wins:
/// no result or no match, then missing rating, then a merged record.
pub fn reconcile(restaurant: &Restaurant, search: &ReviewSearchResponse) -> Result<ReviewResponse> {
    let Some(meta) = search.first_result() else {
        return Ok(ReviewResponse::NotFound);
    };
    if !close_enough(restaurant, meta) {
        return Ok(ReviewResponse::NotFound);
    }
    if !meta.get("rating").is_some_and(is_truthy) {
        return Ok(ReviewResponse::RatingNotFound);
    }

    Ok(ReviewResponse::Done {
        restaurant: merge(restaurant, meta)?,
    })
}

/// Whether a fetched result describes the scraped restaurant.
///
/// Accepts every pair for now. The review API exposes `addressStreet`,
/// `addressZipcode`, `addressCity` and `addressState` but the scraped
/// record only has a placeholder address, so there is nothing to compare.
pub fn close_enough(restaurant: &Restaurant, meta: &Map<String, Value>) -> bool {
    debug!(
        scraped = restaurant.name.as_str(),
        fetched = ?meta.get("name"),
        "Comparing restaurants"
    );
    true
}

/// Overlay fetched fields onto the serialized restaurant; fetched values win.
pub fn merge(restaurant: &Restaurant, meta: &Map<String, Value>) -> Result<Map<String, Value>> {
    let mut merged = match serde_json::to_value(restaurant)? {
        Value::Object(map) => map,
        other => anyhow::bail!("restaurant serialized to non-object: {other}"),
    };
    merged.extend(meta.iter().map(|(k, v)| (k.clone(), v.clone())));
    Ok(merged)
}

/// Falsy values are null, false, zero, NaN and the empty string.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
