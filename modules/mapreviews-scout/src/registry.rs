use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use tracing::debug;

use mapreviews_common::{MapBounds, Restaurant, ReviewResponse};

use crate::page_scraper::ResultEntry;

#[derive(Debug, Clone)]
pub struct TrackedRestaurant {
    pub restaurant: Restaurant,
    pub discovered_at: DateTime<Utc>,
    /// Latest reply from the review worker, if one has arrived.
    pub review: Option<ReviewResponse>,
}

/// Restaurants seen during this session, keyed by display text.
///
/// Grows monotonically: entries that scroll out of view are kept. When
/// `max_entries` is set the oldest discoveries are evicted first.
#[derive(Debug, Default)]
pub struct RestaurantRegistry {
    entries: HashMap<String, TrackedRestaurant>,
    order: VecDeque<String>,
    max_entries: Option<usize>,
}

impl RestaurantRegistry {
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            max_entries,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, display_text: &str) -> bool {
        self.entries.contains_key(display_text)
    }

    pub fn get(&self, display_text: &str) -> Option<&TrackedRestaurant> {
        self.entries.get(display_text)
    }

    /// Tracked restaurants in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackedRestaurant> {
        self.order.iter().filter_map(|key| self.entries.get(key))
    }

    /// Record every entry not seen before, tagged with `bounds`. Returns the
    /// newly created restaurants in page order.
    pub fn ingest(&mut self, entries: Vec<ResultEntry>, bounds: MapBounds) -> Vec<Restaurant> {
        let mut discovered = Vec::new();

        for entry in entries {
            if self.entries.contains_key(&entry.display_text) {
                continue;
            }

            let restaurant = Restaurant::scraped(entry.label, entry.display_text.clone(), bounds);
            debug!(name = restaurant.name.as_str(), "Discovered restaurant");
            self.entries.insert(
                entry.display_text.clone(),
                TrackedRestaurant {
                    restaurant: restaurant.clone(),
                    discovered_at: Utc::now(),
                    review: None,
                },
            );
            self.order.push_back(entry.display_text);
            discovered.push(restaurant);
        }

        self.evict_overflow();
        discovered
    }

    /// Attach a review reply. Returns false if the restaurant is no longer tracked.
    pub fn record_review(&mut self, display_text: &str, response: ReviewResponse) -> bool {
        match self.entries.get_mut(display_text) {
            Some(tracked) => {
                tracked.review = Some(response);
                true
            }
            None => false,
        }
    }

    /// Count of tracked restaurants per review status; `pending` for those
    /// still waiting on a reply.
    pub fn status_counts(&self) -> HashMap<&'static str, usize> {
        let mut counts = HashMap::new();
        for tracked in self.entries.values() {
            let status = tracked.review.as_ref().map_or("pending", ReviewResponse::status);
            *counts.entry(status).or_insert(0) += 1;
        }
        counts
    }

    fn evict_overflow(&mut self) {
        let Some(max) = self.max_entries else {
            return;
        };
        while self.order.len() > max {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                debug!(display_text = oldest.as_str(), "Evicted restaurant");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(north: f64) -> MapBounds {
        MapBounds {
            north_latitude: north,
            east_longitude: -73.9,
            south_latitude: 40.6,
            west_longitude: -74.1,
        }
    }

    fn entry(label: &str, text: &str) -> ResultEntry {
        ResultEntry {
            label: label.to_string(),
            display_text: text.to_string(),
        }
    }

    fn page() -> Vec<ResultEntry> {
        vec![entry("Joe's Pizza", "Joe's Pizza 4.5"), entry("Lucali", "Lucali 4.7")]
    }

    #[test]
    fn new_entries_become_restaurants() {
        let mut registry = RestaurantRegistry::new(None);
        let found = registry.ingest(page(), bounds(40.8));

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "Joe's Pizza");
        assert_eq!(found[0].display_text, "Joe's Pizza 4.5");
        assert_eq!(found[0].address_street.as_deref(), Some("string"));
        assert_eq!(found[0].location.as_deref(), Some(""));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn reingesting_unchanged_page_adds_nothing() {
        let mut registry = RestaurantRegistry::new(None);
        registry.ingest(page(), bounds(40.8));
        let again = registry.ingest(page(), bounds(40.8));

        assert!(again.is_empty());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn bounds_snapshot_is_not_updated_later() {
        let mut registry = RestaurantRegistry::new(None);
        registry.ingest(page(), bounds(40.8));
        let found = registry.ingest(
            vec![entry("Joe's Pizza", "Joe's Pizza 4.5"), entry("Di Fara", "Di Fara 4.4")],
            bounds(41.0),
        );

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].map_bounds.north_latitude, 41.0);
        let joes = registry.get("Joe's Pizza 4.5").unwrap();
        assert_eq!(joes.restaurant.map_bounds.north_latitude, 40.8);
    }

    #[test]
    fn duplicate_text_on_one_page_tracked_once() {
        let mut registry = RestaurantRegistry::new(None);
        let found = registry.ingest(
            vec![entry("A", "same text"), entry("B", "same text")],
            bounds(40.8),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "A");
    }

    #[test]
    fn entries_that_scroll_away_are_kept() {
        let mut registry = RestaurantRegistry::new(None);
        registry.ingest(page(), bounds(40.8));
        registry.ingest(vec![entry("Di Fara", "Di Fara 4.4")], bounds(40.8));
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("Lucali 4.7"));
    }

    #[test]
    fn cap_evicts_oldest_first() {
        let mut registry = RestaurantRegistry::new(Some(2));
        registry.ingest(page(), bounds(40.8));
        registry.ingest(vec![entry("Di Fara", "Di Fara 4.4")], bounds(40.8));

        assert_eq!(registry.len(), 2);
        assert!(!registry.contains("Joe's Pizza 4.5"));
        let names: Vec<_> = registry.iter().map(|t| t.restaurant.name.as_str()).collect();
        assert_eq!(names, vec!["Lucali", "Di Fara"]);
    }

    #[test]
    fn review_replies_are_recorded() {
        let mut registry = RestaurantRegistry::new(None);
        registry.ingest(page(), bounds(40.8));

        assert!(registry.record_review("Lucali 4.7", ReviewResponse::RatingNotFound));
        assert!(!registry.record_review("Unknown", ReviewResponse::NotFound));

        let counts = registry.status_counts();
        assert_eq!(counts.get("restaurant rating not found"), Some(&1));
        assert_eq!(counts.get("pending"), Some(&1));
    }
}
