//! SerpAPI Google Patents client.
//!
//! One `GET /search` per attempt. Only connection-level failures are
//! retried, and only once.

use crate::error::ProviderError;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Message SerpAPI returns (with HTTP 200) when a query has no hits.
const NO_RESULTS_MARKER: &str = "hasn't returned any results";

/// Settings for the provider client.
#[derive(Clone)]
pub struct ProviderSettings {
    /// Base URL, e.g. `https://serpapi.com`.
    pub base_url: String,
    /// SerpAPI engine name.
    pub engine: String,
    pub api_key: String,
    /// Page size requested from the provider.
    pub num_results: usize,
    pub timeout_seconds: u64,
    /// Retry once when the request fails at the network level.
    pub retry_on_network_error: bool,
}

/// Client for the SerpAPI search endpoint.
pub struct SerpApiClient {
    settings: ProviderSettings,
    http_client: reqwest::Client,
}

impl SerpApiClient {
    /// Create a client. The API key is not validated here.
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            settings,
            http_client,
        })
    }

    /// Search for patents and return the raw result objects.
    pub async fn search(&self, query: &str) -> Result<Vec<Value>, ProviderError> {
        info!(query = %query, engine = %self.settings.engine, "Searching patents via SerpAPI");

        match self.search_once(query).await {
            Err(e) if e.is_transient() && self.settings.retry_on_network_error => {
                warn!("Search failed ({}), retrying once", e);
                self.search_once(query).await
            }
            other => other,
        }
    }

    async fn search_once(&self, query: &str) -> Result<Vec<Value>, ProviderError> {
        let url = format!("{}/search", self.settings.base_url.trim_end_matches('/'));
        let num = self.settings.num_results.to_string();

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("engine", self.settings.engine.as_str()),
                ("q", query),
                ("api_key", self.settings.api_key.as_str()),
                ("num", num.as_str()),
                ("output", "json"),
                ("no_cache", "true"),
            ])
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        debug!(status = %status, "Provider responded");

        let body = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| ProviderError::MalformedResponse(format!("invalid JSON: {}", e)))?;

        let results = organic_results(payload, self.settings.num_results)?;
        info!("Provider returned {} results", results.len());
        Ok(results)
    }

    /// Map a reqwest failure to a provider error. The URL is stripped so
    /// the API key never ends up in an error message.
    fn classify(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout {
                seconds: self.settings.timeout_seconds,
            }
        } else {
            ProviderError::Network(e.without_url().to_string())
        }
    }
}

fn status_error(status: StatusCode, body: &str) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication {
            status: status.as_u16(),
        },
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited,
        _ => {
            let message = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(String::from))
                .unwrap_or_else(|| body.chars().take(200).collect());
            ProviderError::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}

/// Pull the `organic_results` array out of a successful payload.
pub fn organic_results(payload: Value, limit: usize) -> Result<Vec<Value>, ProviderError> {
    let Value::Object(mut obj) = payload else {
        return Err(ProviderError::MalformedResponse(
            "expected a JSON object".to_string(),
        ));
    };

    if let Some(message) = obj.get("error").and_then(Value::as_str) {
        if message.contains(NO_RESULTS_MARKER) {
            debug!("Provider reported no results");
            return Ok(Vec::new());
        }
        return Err(ProviderError::Api {
            status: 200,
            message: message.to_string(),
        });
    }

    match obj.remove("organic_results") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.into_iter().take(limit).collect()),
        Some(_) => Err(ProviderError::MalformedResponse(
            "organic_results is not an array".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// A server that drops its first connection without answering and
    /// serves `body` on every later one. Returns the base URL and a
    /// counter of accepted connections.
    async fn drop_first_connection(body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    drop(socket);
                    continue;
                }
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), attempts)
    }

    fn settings(base_url: &str) -> ProviderSettings {
        ProviderSettings {
            base_url: base_url.to_string(),
            engine: "google_patents".to_string(),
            api_key: "test-key".to_string(),
            num_results: 10,
            timeout_seconds: 5,
            retry_on_network_error: true,
        }
    }

    #[test]
    fn test_organic_results_truncates() {
        let payload = json!({"organic_results": [{"title": "a"}, {"title": "b"}, {"title": "c"}]});
        let results = organic_results(payload, 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1]["title"], "b");
    }

    #[test]
    fn test_organic_results_missing_is_empty() {
        let payload = json!({"search_metadata": {"status": "Success"}});
        assert!(organic_results(payload, 10).unwrap().is_empty());
    }

    #[test]
    fn test_organic_results_no_results_error() {
        let payload = json!({"error": "Google Patents hasn't returned any results for this query."});
        assert!(organic_results(payload, 10).unwrap().is_empty());
    }

    #[test]
    fn test_organic_results_other_error() {
        let payload = json!({"error": "Your account has run out of searches."});
        let err = organic_results(payload, 10).unwrap_err();
        assert!(matches!(err, ProviderError::Api { status: 200, .. }));
    }

    #[test]
    fn test_organic_results_malformed() {
        assert!(matches!(
            organic_results(json!([1, 2, 3]), 10),
            Err(ProviderError::MalformedResponse(_))
        ));
        assert!(matches!(
            organic_results(json!({"organic_results": "nope"}), 10),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_search_success_sends_expected_params() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("engine", "google_patents"))
            .and(query_param("q", "AI shoe manufacturing"))
            .and(query_param("api_key", "test-key"))
            .and(query_param("num", "10"))
            .and(query_param("no_cache", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organic_results": [
                    {"title": "Shoe knitting", "inventor": "Jane Doe"},
                    {"title": "Sole molding", "inventor": "John Smith"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SerpApiClient::new(settings(&server.uri())).unwrap();
        let results = client.search("AI shoe manufacturing").await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["title"], "Shoe knitting");
    }

    #[tokio::test]
    async fn test_search_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid API key."})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = SerpApiClient::new(settings(&server.uri())).unwrap();
        let err = client.search("anything").await.unwrap_err();

        assert!(matches!(err, ProviderError::Authentication { status: 401 }));
    }

    #[tokio::test]
    async fn test_search_rate_limited() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = SerpApiClient::new(settings(&server.uri())).unwrap();
        let err = client.search("anything").await.unwrap_err();

        assert!(matches!(err, ProviderError::RateLimited));
    }

    #[tokio::test]
    async fn test_search_server_error_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"error": "Internal failure"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = SerpApiClient::new(settings(&server.uri())).unwrap();
        match client.search("anything").await {
            Err(ProviderError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Internal failure");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_invalid_json() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = SerpApiClient::new(settings(&server.uri())).unwrap();
        let err = client.search("anything").await.unwrap_err();

        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_search_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"organic_results": []}))
                    .set_delay(Duration::from_secs(3)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut s = settings(&server.uri());
        s.timeout_seconds = 1;
        let client = SerpApiClient::new(s).unwrap();
        let err = client.search("anything").await.unwrap_err();

        assert!(matches!(err, ProviderError::Timeout { seconds: 1 }));
    }

    #[tokio::test]
    async fn test_search_connection_refused_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = SerpApiClient::new(settings(&format!("http://{}", addr))).unwrap();
        let err = client.search("anything").await.unwrap_err();

        assert!(matches!(err, ProviderError::Network(_)));
        assert!(!err.to_string().contains("test-key"));
    }

    #[tokio::test]
    async fn test_network_failure_is_retried_once() {
        let (base_url, attempts) =
            drop_first_connection(r#"{"organic_results": [{"title": "Recovered"}]}"#).await;

        let client = SerpApiClient::new(settings(&base_url)).unwrap();
        let results = client.search("anything").await.unwrap();

        assert_eq!(results[0]["title"], "Recovered");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_network_failure_without_retry() {
        let (base_url, attempts) = drop_first_connection(r#"{"organic_results": []}"#).await;

        let mut s = settings(&base_url);
        s.retry_on_network_error = false;
        let client = SerpApiClient::new(s).unwrap();
        let err = client.search("anything").await.unwrap_err();

        assert!(matches!(err, ProviderError::Network(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let client = SerpApiClient::new(settings(&server.uri())).unwrap();
        assert!(matches!(
            client.search("anything").await,
            Err(ProviderError::RateLimited)
        ));
    }
}
