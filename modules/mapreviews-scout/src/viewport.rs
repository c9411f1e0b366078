//! Viewport estimation from the map page URL and the rendered canvas size.
//!
//! Map URLs carry the center and zoom in a path segment like
//! `/maps/search/Restaurants/@40.7,-74.0,12z/data=...`. Together with the
//! canvas dimensions that is enough to approximate the visible lat/lng box
//! using Web-Mercator ground resolution.

use std::f64::consts::PI;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use url::Url;

use mapreviews_common::MapBounds;

/// WGS-84 equatorial radius in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Tile edge in pixels at zoom 0.
const TILE_SIZE: f64 = 256.0;

/// Path segment holding `@lat,lng,zoom`.
const COORDINATE_SEGMENT: usize = 4;

static FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-.0-9]+").unwrap());

pub type Result<T> = std::result::Result<T, ViewportError>;

#[derive(Debug, Error)]
pub enum ViewportError {
    #[error("Invalid page URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Path {0:?} has no coordinate segment")]
    MissingSegment(String),

    #[error("Coordinate segment {segment:?} has no parseable {field}")]
    BadCoordinate { segment: String, field: &'static str },

    #[error("Map canvas not found on page")]
    CanvasMissing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCoordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
}

/// Rendered map canvas size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

/// Parse `latitude, longitude, zoom` out of a map URL path.
///
/// Each comma-separated token is reduced to its first run of `[-.0-9]`, so
/// `@40.7` becomes `40.7` and `12z` becomes `12`.
pub fn coordinates_from_path(path: &str) -> Result<MapCoordinates> {
    let segment = path
        .split('/')
        .nth(COORDINATE_SEGMENT)
        .ok_or_else(|| ViewportError::MissingSegment(path.to_string()))?;

    let mut tokens = segment.split(',');
    let mut next = |field: &'static str| -> Result<f64> {
        tokens
            .next()
            .and_then(|token| FLOAT_RE.find(token))
            .and_then(|m| parse_float_prefix(m.as_str()))
            .ok_or_else(|| ViewportError::BadCoordinate {
                segment: segment.to_string(),
                field,
            })
    };

    Ok(MapCoordinates {
        latitude: next("latitude")?,
        longitude: next("longitude")?,
        zoom: next("zoom")?,
    })
}

/// Longest leading run of `token` that parses as a number, so `12.5.1`
/// reads as `12.5` and `1-2` as `1`.
fn parse_float_prefix(token: &str) -> Option<f64> {
    (1..=token.len())
        .rev()
        .filter(|&end| token.is_char_boundary(end))
        .find_map(|end| token[..end].parse::<f64>().ok())
}

/// Parse coordinates from a full page URL.
pub fn coordinates_from_url(url: &str) -> Result<MapCoordinates> {
    let parsed = Url::parse(url).map_err(|e| ViewportError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    coordinates_from_path(parsed.path())
}

/// Ground resolution at `latitude` for a Web-Mercator zoom level.
pub fn meters_per_pixel(latitude: f64, zoom: f64) -> f64 {
    (latitude * PI / 180.0).cos() * 2.0 * PI * EARTH_RADIUS / (TILE_SIZE * 2f64.powf(zoom))
}

/// Approximate the lat/lng box visible on a canvas centered at `coords`.
pub fn bounds_from_coordinates(coords: &MapCoordinates, canvas: &CanvasSize) -> MapBounds {
    let mpp = meters_per_pixel(coords.latitude, coords.zoom);
    let dy = (canvas.height / 2.0) * mpp;
    let dx = (canvas.width / 2.0) * mpp;

    let lat_delta = (dy / EARTH_RADIUS) * (180.0 / PI);
    let lng_delta = (dx / EARTH_RADIUS) * (180.0 / PI) / (coords.latitude * PI / 180.0).cos();

    MapBounds {
        north_latitude: coords.latitude + lat_delta,
        east_longitude: coords.longitude + lng_delta,
        south_latitude: coords.latitude - lat_delta,
        west_longitude: coords.longitude - lng_delta,
    }
}

/// Holds the most recently computed viewport.
#[derive(Debug, Default)]
pub struct ViewportTracker {
    current: Option<MapBounds>,
}

impl ViewportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<MapBounds> {
        self.current
    }

    /// Recompute bounds from the page URL and canvas. A missing canvas fails
    /// the refresh and leaves the previous bounds in place.
    pub fn refresh(&mut self, url: &str, canvas: Option<CanvasSize>) -> Result<MapBounds> {
        let coords = coordinates_from_url(url)?;
        let canvas = canvas.ok_or(ViewportError::CanvasMissing)?;
        let bounds = bounds_from_coordinates(&coords, &canvas);
        self.current = Some(bounds);
        Ok(bounds)
    }
}
