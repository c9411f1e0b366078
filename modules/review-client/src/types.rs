use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level body of `GET /v1/reviews`.
///
/// Only the `search.results` list is modelled; each result stays a raw JSON
/// object because callers overlay it onto their own record verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewSearchResponse {
    #[serde(default)]
    pub search: Option<SearchResults>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub results: Vec<Value>,
}

impl ReviewSearchResponse {
    /// First search result, if it is a JSON object.
    pub fn first_result(&self) -> Option<&Map<String, Value>> {
        self.search.as_ref()?.results.first()?.as_object()
    }

    pub fn from_results(results: Vec<Value>) -> Self {
        Self {
            search: Some(SearchResults { results }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_result_reads_search_results() {
        let body: ReviewSearchResponse = serde_json::from_value(json!({
            "search": { "results": [ { "name": "Via Carota", "rating": 9.4 }, { "name": "Other" } ] },
            "meta": { "total": 2 }
        }))
        .unwrap();

        let first = body.first_result().unwrap();
        assert_eq!(first["name"], "Via Carota");
    }

    #[test]
    fn missing_search_block_has_no_result() {
        let body: ReviewSearchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(body.first_result().is_none());
    }

    #[test]
    fn empty_results_have_no_result() {
        let body = ReviewSearchResponse::from_results(vec![]);
        assert!(body.first_result().is_none());
    }

    #[test]
    fn non_object_result_is_ignored() {
        let body = ReviewSearchResponse::from_results(vec![json!("oops")]);
        assert!(body.first_result().is_none());
    }
}
