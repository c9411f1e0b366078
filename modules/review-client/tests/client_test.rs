//! ReviewClient wire tests against a local mock server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mapreviews_common::MapBounds;
use review_client::{ReviewApiError, ReviewClient};

fn bounds() -> MapBounds {
    MapBounds {
        north_latitude: 45.0158705,
        east_longitude: -71.777491,
        south_latitude: 40.477399,
        west_longitude: -79.76258999999999,
    }
}

fn client(server: &MockServer) -> ReviewClient {
    ReviewClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn search_sends_fixed_query_and_decodes_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/reviews"))
        .and(query_param("bounds", "45.0158705,-71.777491,40.477399,-79.76258999999999"))
        .and(query_param("q", "Joe's & Pizza"))
        .and(query_param("page", "1"))
        .and(query_param("count", "1"))
        .and(query_param("location", ""))
        .and(query_param("categoryIds", ""))
        .and(query_param("open", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "search": { "results": [ { "name": "Joe's Pizza", "rating": 8.1 } ] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let body = client(&server).search("Joe's & Pizza", &bounds()).await.unwrap();
    assert_eq!(body.first_result().unwrap()["rating"], 8.1);

    let requests = server.received_requests().await.unwrap();
    let query = requests[0].url.query().unwrap().to_string();
    assert!(query.starts_with("bounds=45.0158705%2C-71.777491%2C40.477399%2C-79.76258999999999&"));
    assert!(query.contains("+%26"), "only the first & is escaped: {query}");
    assert!(query.ends_with("&allowsReservations=&count=1&prices=&ratings=&open="));
}

#[tokio::test]
async fn non_success_status_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/reviews"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = client(&server).search("Lucali", &bounds()).await.unwrap_err();
    match err {
        ReviewApiError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "upstream down");
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/reviews"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = client(&server).search("Lucali", &bounds()).await.unwrap_err();
    assert!(matches!(err, ReviewApiError::Parse(_)));
}
