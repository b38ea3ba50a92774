//! Search controller: dispatches queries and holds the latest results.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::model::{SearchQuery, SearchResultSet};
use crate::api::{ApiGateway, HttpMethod, RequestBody, endpoints};
use crate::error::{LodestoneError, Result};
use crate::error_state::ErrorState;
use crate::session::Credential;

pub const SEARCH_FAILED: &str = "Search failed";

/// Issues semantic queries and holds the latest result set.
///
/// Overlapping submissions are not serialized: each one replaces the held
/// results when it completes, so the response that lands last wins.
/// Responses to queries dispatched before a [`clear`](Self::clear) are
/// returned to their caller but never stored.
pub struct SearchController {
    gateway: Arc<ApiGateway>,
    errors: Arc<ErrorState>,
    results: RwLock<Option<SearchResultSet>>,
    epoch: AtomicU64,
}

impl SearchController {
    pub fn new(gateway: Arc<ApiGateway>, errors: Arc<ErrorState>) -> Self {
        Self {
            gateway,
            errors,
            results: RwLock::new(None),
            epoch: AtomicU64::new(0),
        }
    }

    /// Submits `query` as a single JSON request.
    ///
    /// `max_results` is passed through as given; range checks belong to the
    /// input layer.
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank query. Nothing is sent and no state changes.
    /// - Any gateway error. `"Search failed"` is recorded and the previous
    ///   results are kept.
    pub async fn submit(&self, query: &SearchQuery, credential: &Credential) -> Result<SearchResultSet> {
        if !query.is_submittable() {
            return Err(LodestoneError::validation("Enter a search query"));
        }

        self.errors.clear().await;
        let epoch = self.epoch.load(Ordering::SeqCst);

        let response = self
            .gateway
            .call(
                endpoints::SEMANTIC_QUERY,
                HttpMethod::Post,
                RequestBody::json(query)?,
                Some(credential),
            )
            .await;

        match response {
            Ok(value) => {
                let results = SearchResultSet(value);
                tracing::debug!(query = %query.query, max_results = query.max_results, "search completed");
                let mut held = self.results.write().await;
                if self.epoch.load(Ordering::SeqCst) == epoch {
                    *held = Some(results.clone());
                } else {
                    tracing::debug!(query = %query.query, "discarding results from a cleared controller");
                }
                Ok(results)
            }
            Err(e) => {
                tracing::warn!(query = %query.query, error = %e, "search failed");
                self.errors.set(SEARCH_FAILED).await;
                Err(e)
            }
        }
    }

    pub async fn results(&self) -> Option<SearchResultSet> {
        self.results.read().await.clone()
    }

    /// Drops held results when the session ends.
    pub async fn clear(&self) {
        let mut held = self.results.write().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        *held = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiResponse;
    use crate::testing::ScriptedTransport;
    use serde_json::json;
    use std::time::Duration;

    struct Fixture {
        transport: Arc<ScriptedTransport>,
        errors: Arc<ErrorState>,
        controller: Arc<SearchController>,
        credential: Credential,
    }

    fn fixture() -> Fixture {
        let transport = Arc::new(ScriptedTransport::new());
        let errors = Arc::new(ErrorState::new());
        let gateway = Arc::new(ApiGateway::new(transport.clone()));
        Fixture {
            controller: Arc::new(SearchController::new(gateway, errors.clone())),
            transport,
            errors,
            credential: Credential::new("tok"),
        }
    }

    #[tokio::test]
    async fn test_invoices_scenario() {
        let f = fixture();
        let matches = json!({"matches": [{"id": 1, "score": 0.9}]});
        f.transport.respond(HttpMethod::Post, endpoints::SEMANTIC_QUERY, ApiResponse::json(200, &matches));
        f.errors.set("stale message").await;

        let results = f
            .controller
            .submit(&SearchQuery::new("invoices").with_max_results(5), &f.credential)
            .await
            .unwrap();

        assert_eq!(results, SearchResultSet(matches.clone()));
        assert_eq!(f.controller.results().await, Some(SearchResultSet(matches)));
        assert_eq!(f.errors.current().await, None);

        let sent = &f.transport.requests()[0];
        assert_eq!(sent.body, RequestBody::Json(json!({"query": "invoices", "max_results": 5})));
        assert_eq!(sent.authorization(), Some("Bearer tok".to_string()));
    }

    #[tokio::test]
    async fn test_payload_omits_absent_fields() {
        let f = fixture();
        f.transport.respond(HttpMethod::Post, endpoints::SEMANTIC_QUERY, ApiResponse::json(200, &json!({})));

        f.controller.submit(&SearchQuery::new("x"), &f.credential).await.unwrap();

        match &f.transport.requests()[0].body {
            RequestBody::Json(payload) => {
                let keys: Vec<&String> = payload.as_object().unwrap().keys().collect();
                assert_eq!(keys.len(), 2);
                assert_eq!(payload, &json!({"query": "x", "max_results": 10}));
            }
            other => panic!("expected JSON body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_query_is_a_no_op() {
        let f = fixture();
        f.errors.set("previous").await;

        let err = f.controller.submit(&SearchQuery::new("   "), &f.credential).await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(f.transport.request_count(), 0);
        assert_eq!(f.errors.current().await.as_deref(), Some("previous"));
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_results() {
        let f = fixture();
        let first = json!({"matches": [{"id": 3, "score": 0.4}]});
        f.transport.respond(HttpMethod::Post, endpoints::SEMANTIC_QUERY, ApiResponse::json(200, &first));
        f.transport.respond(HttpMethod::Post, endpoints::SEMANTIC_QUERY, ApiResponse::new(500, "index offline"));

        f.controller.submit(&SearchQuery::new("a"), &f.credential).await.unwrap();
        assert!(f.controller.submit(&SearchQuery::new("b"), &f.credential).await.is_err());

        assert_eq!(f.controller.results().await, Some(SearchResultSet(first)));
        assert_eq!(f.errors.current().await.as_deref(), Some(SEARCH_FAILED));
    }

    #[tokio::test]
    async fn test_out_of_range_max_results_passes_through() {
        let f = fixture();
        f.transport.respond(HttpMethod::Post, endpoints::SEMANTIC_QUERY, ApiResponse::json(200, &json!({})));

        f.controller
            .submit(&SearchQuery::new("x").with_max_results(250), &f.credential)
            .await
            .unwrap();

        assert_eq!(
            f.transport.requests()[0].body,
            RequestBody::Json(json!({"query": "x", "max_results": 250}))
        );
    }

    #[tokio::test]
    async fn test_results_arriving_after_clear_are_not_held() {
        let f = fixture();
        let late = json!({"matches": [{"id": 9}]});
        f.transport.respond_after(
            HttpMethod::Post,
            endpoints::SEMANTIC_QUERY,
            ApiResponse::json(200, &late),
            Duration::from_millis(50),
        );

        let query = SearchQuery::new("payroll");
        let late_clear = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            f.controller.clear().await;
        };
        let (returned, ()) = tokio::join!(f.controller.submit(&query, &f.credential), late_clear);

        assert_eq!(returned.unwrap(), SearchResultSet(late));
        assert_eq!(f.controller.results().await, None);
    }

    #[tokio::test]
    async fn test_overlapping_searches_last_response_wins() {
        let f = fixture();
        let slow = json!({"matches": [{"id": 1}]});
        let fast = json!({"matches": [{"id": 2}]});
        f.transport.respond_after(
            HttpMethod::Post,
            endpoints::SEMANTIC_QUERY,
            ApiResponse::json(200, &slow),
            Duration::from_millis(60),
        );
        f.transport.respond_after(
            HttpMethod::Post,
            endpoints::SEMANTIC_QUERY,
            ApiResponse::json(200, &fast),
            Duration::from_millis(5),
        );

        let first = SearchQuery::new("first");
        let second = SearchQuery::new("second");
        let (a, b) = tokio::join!(
            f.controller.submit(&first, &f.credential),
            f.controller.submit(&second, &f.credential),
        );
        assert!(a.is_ok() && b.is_ok());

        // The first-issued request resolved last, so its results are held.
        assert_eq!(f.controller.results().await, Some(SearchResultSet(slow)));
    }
}
