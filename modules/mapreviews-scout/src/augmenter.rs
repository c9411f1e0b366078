//! Page-side orchestration: on every tick, re-render the page, refresh the
//! viewport, pick up new restaurants and ask the review worker about them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mapreviews_common::{ExtensionRequest, Restaurant, ReviewResponse};

use crate::channel::{ChannelError, ReviewHandle};
use crate::page_scraper::{canvas_size, extract_entries};
use crate::page_source::PageSource;
use crate::registry::RestaurantRegistry;
use crate::viewport::ViewportTracker;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub scraped: usize,
    pub discovered: usize,
    pub tracked: usize,
    pub in_flight: usize,
}

impl fmt::Display for CycleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scraped={} discovered={} tracked={} in_flight={}",
            self.scraped, self.discovered, self.tracked, self.in_flight
        )
    }
}

/// Reply for one dispatched restaurant. `None` when the cycle was cancelled
/// before the reply arrived.
struct Dispatched {
    display_text: String,
    reply: Option<Result<ReviewResponse, ChannelError>>,
}

/// Owns all page-side state: the current viewport, the restaurants seen so
/// far and the outstanding review requests.
pub struct Augmenter {
    source: Arc<dyn PageSource>,
    reviews: ReviewHandle,
    viewport: ViewportTracker,
    registry: RestaurantRegistry,
    in_flight: JoinSet<Dispatched>,
    poll_interval: Duration,
}

impl Augmenter {
    pub fn new(
        source: Arc<dyn PageSource>,
        reviews: ReviewHandle,
        poll_interval: Duration,
        max_tracked: Option<usize>,
    ) -> Self {
        Self {
            source,
            reviews,
            viewport: ViewportTracker::new(),
            registry: RestaurantRegistry::new(max_tracked),
            in_flight: JoinSet::new(),
            poll_interval,
        }
    }

    pub fn registry(&self) -> &RestaurantRegistry {
        &self.registry
    }

    pub fn viewport(&self) -> &ViewportTracker {
        &self.viewport
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// One scrape cycle. Fails without touching the registry if the page
    /// cannot be rendered or is missing the canvas or results list.
    pub async fn run_cycle(&mut self, cancel: &CancellationToken) -> Result<CycleStats> {
        self.reap_finished();

        let snapshot = self
            .source
            .snapshot()
            .await
            .with_context(|| format!("{} snapshot failed", self.source.name()))?;

        debug!(url = snapshot.url.as_str(), "Rebuilding map bounds");
        let bounds = self
            .viewport
            .refresh(&snapshot.url, canvas_size(&snapshot.html))
            .context("viewport refresh failed")?;

        debug!("Parsing visible restaurant list");
        let entries = extract_entries(&snapshot.html).context("results list unavailable")?;
        let scraped = entries.len();

        let discovered = self.registry.ingest(entries, bounds);
        for restaurant in &discovered {
            self.dispatch(restaurant.clone(), cancel.clone());
        }

        Ok(CycleStats {
            scraped,
            discovered: discovered.len(),
            tracked: self.registry.len(),
            in_flight: self.in_flight.len(),
        })
    }

    /// Poll until `cancel` fires. A failed cycle is logged and the next tick
    /// starts over from the current page state. Cycles never overlap.
    pub async fn run(&mut self, cancel: CancellationToken) {
        info!(
            source = self.source.name(),
            interval_ms = self.poll_interval.as_millis() as u64,
            "Augmenter started"
        );
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.run_cycle(&cancel).await {
                Ok(stats) if stats.discovered > 0 => info!("Cycle complete. {stats}"),
                Ok(stats) => debug!("Cycle complete. {stats}"),
                Err(e) => {
                    let error = format!("{e:#}");
                    warn!(error = error.as_str(), "Cycle failed");
                }
            }
        }

        self.in_flight.abort_all();
        while let Some(joined) = self.in_flight.join_next().await {
            if let Ok(dispatched) = joined {
                self.record(dispatched);
            }
        }
        info!(tracked = self.registry.len(), "Augmenter stopped");
    }

    /// Wait for every outstanding review request and record its reply.
    pub async fn drain(&mut self) {
        while let Some(joined) = self.in_flight.join_next().await {
            match joined {
                Ok(dispatched) => self.record(dispatched),
                Err(e) => warn!(error = %e, "Review dispatch task failed"),
            }
        }
    }

    fn dispatch(&mut self, restaurant: Restaurant, cancel: CancellationToken) {
        let reviews = self.reviews.clone();
        let display_text = restaurant.display_text.clone();
        info!(name = restaurant.name.as_str(), "Fetching restaurant review meta");

        self.in_flight.spawn(async move {
            let reply = tokio::select! {
                _ = cancel.cancelled() => None,
                reply = reviews.send(ExtensionRequest::fetch_review_meta(restaurant)) => Some(reply),
            };
            Dispatched { display_text, reply }
        });
    }

    fn reap_finished(&mut self) {
        while let Some(joined) = self.in_flight.try_join_next() {
            match joined {
                Ok(dispatched) => self.record(dispatched),
                Err(e) => warn!(error = %e, "Review dispatch task failed"),
            }
        }
    }

    fn record(&mut self, dispatched: Dispatched) {
        let Dispatched { display_text, reply } = dispatched;
        match reply {
            Some(Ok(response)) => {
                info!(
                    display_text = display_text.as_str(),
                    status = response.status(),
                    rating = ?response.rating(),
                    "Review reply"
                );
                self.registry.record_review(&display_text, response);
            }
            Some(Err(e)) => warn!(display_text = display_text.as_str(), error = %e, "Review request failed"),
            None => debug!(display_text = display_text.as_str(), "Review request cancelled"),
        }
    }
}
