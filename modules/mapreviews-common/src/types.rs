use serde::{Deserialize, Serialize};

// --- Viewport ---

/// Axis-aligned lat/lng rectangle approximating the visible map viewport.
///
/// For any finite viewport `north_latitude > south_latitude` and
/// `east_longitude > west_longitude`. The type does not enforce it: a
/// degenerate canvas produces a zero-area box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapBounds {
    pub north_latitude: f64,
    pub east_longitude: f64,
    pub south_latitude: f64,
    pub west_longitude: f64,
}

impl MapBounds {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude < self.north_latitude
            && latitude > self.south_latitude
            && longitude < self.east_longitude
            && longitude > self.west_longitude
    }
}

// --- Restaurant ---

/// A restaurant scraped from one result element on the map page.
///
/// `display_text` is the element's full text content. It ties the record to
/// the element it came from and is only used as a dedup key, never as a
/// stable identifier. `map_bounds` is the viewport in effect when the element
/// was first seen and is not updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub map_bounds: MapBounds,
    #[serde(rename = "gMapsDisplayText")]
    pub display_text: String,
}

/// Address placeholder written on every freshly scraped restaurant until the
/// page exposes a street address.
pub const ADDRESS_PLACEHOLDER: &str = "string";

impl Restaurant {
    /// Build a freshly scraped record with placeholder address fields.
    pub fn scraped(name: String, display_text: String, map_bounds: MapBounds) -> Self {
        Self {
            name,
            address_street: Some(ADDRESS_PLACEHOLDER.to_string()),
            location: Some(String::new()),
            map_bounds,
            display_text,
        }
    }
}
