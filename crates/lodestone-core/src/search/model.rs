//! Search domain models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_MAX_RESULTS: u32 = 10;
pub const MIN_MAX_RESULTS: u32 = 1;
pub const MAX_MAX_RESULTS: u32 = 100;

/// Outbound semantic-search payload.
///
/// Absent optional fields are omitted from the JSON, never sent as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,

    #[serde(default = "default_max_results")]
    pub max_results: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<f64>,
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            collection_name: None,
            max_results: DEFAULT_MAX_RESULTS,
            score_threshold: None,
        }
    }

    pub fn with_collection(mut self, collection_name: impl Into<String>) -> Self {
        self.collection_name = Some(collection_name.into());
        self
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_score_threshold(mut self, score_threshold: f64) -> Self {
        self.score_threshold = Some(score_threshold);
        self
    }

    /// Whether the required `query` field has content.
    pub fn is_submittable(&self) -> bool {
        !self.query.trim().is_empty()
    }
}

/// Raw search-form input, normalized into a [`SearchQuery`].
///
/// This is the input layer: it owns the `[1,100]` range on `max_results` and
/// the `[0,1]` range on `score_threshold`. An empty collection name and a
/// zero threshold count as "not given".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchForm {
    pub query: String,
    pub collection_name: String,
    pub max_results: Option<i64>,
    pub score_threshold: Option<f64>,
}

impl SearchForm {
    pub fn to_query(&self) -> SearchQuery {
        let collection_name = Some(self.collection_name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let max_results = self
            .max_results
            .map(|n| n.clamp(MIN_MAX_RESULTS as i64, MAX_MAX_RESULTS as i64) as u32)
            .unwrap_or(DEFAULT_MAX_RESULTS);

        let score_threshold = self
            .score_threshold
            .filter(|t| t.is_finite())
            .map(|t| t.clamp(0.0, 1.0))
            .filter(|t| *t > 0.0);

        SearchQuery {
            query: self.query.clone(),
            collection_name,
            max_results,
            score_threshold,
        }
    }
}

/// Opaque result payload returned by the semantic query endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchResultSet(pub Value);

impl SearchResultSet {
    /// Whether there is anything worth rendering.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Pretty-printed JSON, as the result pane shows it.
    pub fn to_pretty_string(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.0.to_string())
    }
}
