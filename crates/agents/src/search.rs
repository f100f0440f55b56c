//! Web search capability used by the travel tools.

use runtime::{Error, ToolError};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

const TAVILY_API_URL: &str = "https://api.tavily.com/search";

/// Environment variable holding the Tavily API key.
pub const TAVILY_API_KEY_VAR: &str = "TAVILY_API_KEY";

/// Results requested per query unless configured otherwise.
pub const DEFAULT_MAX_RESULTS: usize = 2;

/// Something that answers a free-text query with raw results.
pub trait SearchBackend: Send + Sync {
    fn search(&self, query: &str) -> impl Future<Output = Result<Value, ToolError>> + Send;
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

/// Tavily search API client.
pub struct TavilySearch {
    http: reqwest::Client,
    api_key: String,
    max_results: usize,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>, max_results: usize) -> runtime::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            max_results: max_results.max(1),
        })
    }

    /// Build a client from `TAVILY_API_KEY`.
    pub fn from_env(max_results: usize) -> runtime::Result<Self> {
        let api_key = std::env::var(TAVILY_API_KEY_VAR)
            .map_err(|_| Error::Config(format!("{TAVILY_API_KEY_VAR} not set")))?;
        Self::new(api_key, max_results)
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }
}

impl std::fmt::Debug for TavilySearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilySearch")
            .field("max_results", &self.max_results)
            .finish_non_exhaustive()
    }
}

impl SearchBackend for TavilySearch {
    async fn search(&self, query: &str) -> Result<Value, ToolError> {
        debug!(query, max_results = self.max_results, "tavily search");

        let response = self
            .http
            .post(TAVILY_API_URL)
            .json(&SearchRequest {
                api_key: &self.api_key,
                query,
                max_results: self.max_results,
            })
            .send()
            .await
            .map_err(|e| ToolError::Execution(format!("search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "tavily search failed");
            return Err(ToolError::Execution(format!("search HTTP {status}: {text}")));
        }

        let mut body: Value = response
            .json()
            .await
            .map_err(|e| ToolError::Execution(format!("invalid search response: {e}")))?;

        Ok(take_results(&mut body))
    }
}

/// The `results` array of a response, or the whole body if it has none.
fn take_results(body: &mut Value) -> Value {
    match body.get_mut("results").map(Value::take) {
        Some(results) => results,
        None => body.take(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(SearchRequest {
            api_key: "tvly-test",
            query: "Weather forecast for Lisbon",
            max_results: 2,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({
                "api_key": "tvly-test",
                "query": "Weather forecast for Lisbon",
                "max_results": 2,
            })
        );
    }

    #[test]
    fn results_are_extracted() {
        let mut body = json!({
            "query": "q",
            "results": [{ "url": "https://example.com", "content": "sunny" }],
        });
        assert_eq!(
            take_results(&mut body),
            json!([{ "url": "https://example.com", "content": "sunny" }])
        );

        let mut bare = json!({ "answer": "sunny" });
        assert_eq!(take_results(&mut bare), json!({ "answer": "sunny" }));
    }

    #[test]
    fn max_results_is_at_least_one() {
        let search = TavilySearch::new("tvly-test", 0).unwrap();
        assert_eq!(search.max_results(), 1);
    }

    #[test]
    fn debug_hides_api_key() {
        let search = TavilySearch::new("tvly-secret", 2).unwrap();
        assert!(!format!("{search:?}").contains("tvly-secret"));
    }
}
