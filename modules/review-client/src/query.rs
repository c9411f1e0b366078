use mapreviews_common::MapBounds;

/// Percent-encoded comma.
const COMMA: &str = "%2C";

/// Serialize bounds as `N%2CE%2CS%2CW`.
pub fn urlify_bounds(bounds: &MapBounds) -> String {
    [
        bounds.north_latitude,
        bounds.east_longitude,
        bounds.south_latitude,
        bounds.west_longitude,
    ]
    .iter()
    .map(f64::to_string)
    .collect::<Vec<_>>()
    .join(COMMA)
}

/// Make a restaurant name usable as the `q` parameter.
///
/// Only the first space and the first `&` are replaced. Every other
/// character, including later spaces and ampersands, passes through as-is.
pub fn urlify_query(q: &str) -> String {
    q.replacen(' ', "+", 1).replacen('&', "%26", 1)
}

/// Build the review search URL for one restaurant. Asks for a single result.
pub fn reviews_url(base_url: &str, name: &str, bounds: &MapBounds) -> String {
    let location = "";
    format!(
        "{}/v1/reviews?bounds={}&categoryIds=&cuisineIds=&cursor=&location={}&page=1&q={}&allowsReservations=&count={}&prices=&ratings=&open=",
        base_url.trim_end_matches('/'),
        urlify_bounds(bounds),
        location,
        urlify_query(name),
        1,
    )
}
