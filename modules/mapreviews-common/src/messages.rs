//! Request/reply protocol between the page-side worker and the background
//! review worker. Field names and status strings match the browser
//! extension's wire format.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::Restaurant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "function")]
pub enum ExtensionRequest {
    #[serde(rename = "fetchReviewMeta")]
    FetchReviewMeta { restaurant: Restaurant },
}

impl ExtensionRequest {
    pub fn fetch_review_meta(restaurant: Restaurant) -> Self {
        Self::FetchReviewMeta { restaurant }
    }
}

/// Exactly one of these is sent back for every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ReviewResponse {
    #[serde(rename = "restaurant not found")]
    NotFound,

    #[serde(rename = "restaurant rating not found")]
    RatingNotFound,

    /// Scraped record overlaid with the fetched review fields.
    #[serde(rename = "done")]
    Done { restaurant: Map<String, Value> },

    /// Network or decode failure while fetching.
    #[serde(rename = "error")]
    Failed { error: String },
}

impl ReviewResponse {
    pub fn status(&self) -> &'static str {
        match self {
            Self::NotFound => "restaurant not found",
            Self::RatingNotFound => "restaurant rating not found",
            Self::Done { .. } => "done",
            Self::Failed { .. } => "error",
        }
    }

    pub fn rating(&self) -> Option<&Value> {
        match self {
            Self::Done { restaurant } => restaurant.get("rating"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MapBounds;
    use serde_json::json;

    #[test]
    fn request_uses_function_tag() {
        let restaurant = Restaurant::scraped(
            "Lucali".into(),
            "Lucali Pizza".into(),
            MapBounds {
                north_latitude: 1.0,
                east_longitude: 1.0,
                south_latitude: 0.0,
                west_longitude: 0.0,
            },
        );
        let json = serde_json::to_value(ExtensionRequest::fetch_review_meta(restaurant)).unwrap();

        assert_eq!(json["function"], "fetchReviewMeta");
        assert_eq!(json["restaurant"]["name"], "Lucali");
    }

    #[test]
    fn unit_statuses_serialize_to_bare_status_object() {
        assert_eq!(
            serde_json::to_value(ReviewResponse::NotFound).unwrap(),
            json!({ "status": "restaurant not found" })
        );
        assert_eq!(
            serde_json::to_value(ReviewResponse::RatingNotFound).unwrap(),
            json!({ "status": "restaurant rating not found" })
        );
    }

    #[test]
    fn done_carries_merged_restaurant() {
        let mut restaurant = Map::new();
        restaurant.insert("name".into(), json!("Lucali"));
        restaurant.insert("rating".into(), json!(9.1));
        let response = ReviewResponse::Done { restaurant };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "status": "done", "restaurant": { "name": "Lucali", "rating": 9.1 } })
        );
        assert_eq!(response.rating(), Some(&json!(9.1)));
        assert_eq!(response.status(), "done");
    }

    #[test]
    fn responses_deserialize_from_wire_format() {
        let parsed: ReviewResponse =
            serde_json::from_str(r#"{"status":"restaurant rating not found"}"#).unwrap();
        assert_eq!(parsed, ReviewResponse::RatingNotFound);
    }
}
