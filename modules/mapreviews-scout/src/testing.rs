// Test mocks for the augmenter pipeline.
//
// Two mocks matching the two trait boundaries:
// - MockPageSource (PageSource) — scripted sequence of snapshots
// - MockReviewSource (ReviewSource) — HashMap-based name→search results
//
// Plus helpers for building result pages and restaurants.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;

use mapreviews_common::{MapBounds, Restaurant};
use review_client::ReviewSearchResponse;

use crate::page_source::{self, PageSnapshot, PageSource, PageSourceError};
use crate::review_fetcher::ReviewSource;

/// Map search URL centered on lower Manhattan at zoom 14.
pub const SEARCH_URL: &str =
    "https://www.google.com/maps/search/Restaurants/@40.7128,-74.006,14z/data=!3m1!4b1";

pub fn sample_bounds() -> MapBounds {
    MapBounds {
        north_latitude: 40.73,
        east_longitude: -73.98,
        south_latitude: 40.70,
        west_longitude: -74.03,
    }
}

pub fn sample_restaurant(name: &str) -> Restaurant {
    Restaurant::scraped(name.to_string(), format!("{name} 4.5"), sample_bounds())
}

/// Render a results page with a 1200x800 canvas and one article per
/// `(label, text)` pair.
pub fn results_page(entries: &[(&str, &str)]) -> String {
    let articles: String = entries
        .iter()
        .map(|(label, text)| format!(r#"<div role="article" aria-label="{label}">{text}</div>"#))
        .collect();
    format!(
        r#"<html><body><canvas width="1200" height="800"></canvas><div role="feed" aria-label="Results for Restaurants">{articles}</div></body></html>"#
    )
}

// ---------------------------------------------------------------------------
// MockPageSource
// ---------------------------------------------------------------------------

/// Returns queued snapshots in order, repeating the last one once the queue
/// is down to a single entry. Errors when nothing was queued.
pub struct MockPageSource {
    snapshots: Mutex<VecDeque<PageSnapshot>>,
    calls: AtomicUsize,
}

impl MockPageSource {
    pub fn new() -> Self {
        Self {
            snapshots: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn then_page(self, url: &str, html: String) -> Self {
        self.snapshots.lock().unwrap().push_back(PageSnapshot {
            url: url.to_string(),
            html,
        });
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockPageSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    async fn snapshot(&self) -> page_source::Result<PageSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.snapshots.lock().unwrap();
        let snapshot = if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() };
        snapshot.ok_or_else(|| PageSourceError::Network("no snapshot queued".into()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// MockReviewSource
// ---------------------------------------------------------------------------

/// HashMap-based review search. Returns `Err` for unregistered names.
/// Tracks peak concurrency so tests can check the fetch cap.
pub struct MockReviewSource {
    results: HashMap<String, Vec<Value>>,
    delay: Duration,
    searched: Mutex<Vec<String>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl MockReviewSource {
    pub fn new() -> Self {
        Self {
            results: HashMap::new(),
            delay: Duration::ZERO,
            searched: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn on_search(mut self, name: &str, results: Vec<Value>) -> Self {
        self.results.insert(name.to_string(), results);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn searched(&self) -> Vec<String> {
        self.searched.lock().unwrap().clone()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Default for MockReviewSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReviewSource for MockReviewSource {
    async fn search(&self, name: &str, _bounds: &MapBounds) -> Result<ReviewSearchResponse> {
        self.searched.lock().unwrap().push(name.to_string());
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        match self.results.get(name) {
            Some(results) => Ok(ReviewSearchResponse::from_results(results.clone())),
            None => bail!("MockReviewSource: no results registered for {name:?}"),
        }
    }
}
