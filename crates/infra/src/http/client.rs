//! Retrying HTTP transport for provider adapters
//!
//! Wraps `reqwest::Client` with a [`RetryPolicy`]: connect errors, timeouts
//! and 5xx responses are retried with capped exponential backoff; every
//! other response goes back to the caller untouched so the adapter can map
//! its status. The `key` query parameter is masked in every logged URL.

use std::time::Duration;

use nimbus_domain::NimbusError;
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::errors::InfraError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(200);
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(5);

/// When and how long to wait before another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_backoff: Duration,
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff: DEFAULT_BASE_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Total attempts including the first; at least one
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`,
    /// capped at the maximum backoff
    pub fn delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_backoff.saturating_mul(1_u32 << exponent).min(self.max_backoff)
    }

    fn retries_status(status: StatusCode) -> bool {
        status.is_server_error()
    }

    fn retries_error(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect() || err.is_request()
    }
}

/// HTTP client with retry and timeout support
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: ReqwestClient,
    policy: RetryPolicy,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// # Errors
    /// Returns `NimbusError::Network` if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, NimbusError> {
        Self::builder().build()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// `GET url?query` with retries
    ///
    /// # Errors
    /// See [`send`](Self::send).
    pub async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Response, NimbusError> {
        self.send(self.client.get(url).query(query)).await
    }

    /// Execute `builder`, retrying transient failures
    ///
    /// The last response is returned even when it is a 5xx; only transport
    /// errors become `Err`.
    ///
    /// # Errors
    /// The mapped transport error of the last attempt, or
    /// `NimbusError::Internal` if the request cannot be cloned for a retry.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, NimbusError> {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;

        loop {
            let request = builder
                .try_clone()
                .ok_or_else(|| NimbusError::Internal("request body cannot be retried".into()))?
                .build()
                .map_err(|err| NimbusError::from(InfraError::from(err)))?;
            let url = redact(request.url());
            let method = request.method().clone();
            let last_attempt = attempt >= max_attempts;

            debug!(attempt, %method, %url, "Sending HTTP request");
            match self.client.execute(request).await {
                Ok(response) if last_attempt || !RetryPolicy::retries_status(response.status()) => {
                    debug!(attempt, %url, status = %response.status(), "Received HTTP response");
                    return Ok(response);
                }
                Ok(response) => {
                    warn!(attempt, %url, status = %response.status(), "Server error, retrying");
                }
                Err(err) if last_attempt || !RetryPolicy::retries_error(&err) => {
                    debug!(attempt, %url, error = %err, "HTTP request failed");
                    return Err(InfraError::from(err).into());
                }
                Err(err) => {
                    warn!(attempt, %url, error = %err, "HTTP request failed, retrying");
                }
            }

            let delay = self.policy.delay(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }
}

/// Builder for [`HttpClient`]
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    policy: RetryPolicy,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { timeout: DEFAULT_TIMEOUT, policy: RetryPolicy::default(), user_agent: None }
    }
}

impl HttpClientBuilder {
    /// Per-attempt timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total number of attempts (initial try + retries)
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.policy.max_attempts = attempts.max(1);
        self
    }

    pub fn backoff(mut self, base: Duration, max: Duration) -> Self {
        self.policy.base_backoff = base;
        self.policy.max_backoff = max.max(base);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// # Errors
    /// Returns `NimbusError::Network` if the underlying client cannot be built.
    pub fn build(self) -> Result<HttpClient, NimbusError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        let client = builder.build().map_err(|err| NimbusError::from(InfraError::from(err)))?;

        Ok(HttpClient { client, policy: self.policy })
    }
}

/// URL with the `key` query parameter masked, for logging
fn redact(url: &reqwest::Url) -> String {
    if !url.query_pairs().any(|(name, _)| name == "key") {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            let value = if name == "key" { "***".to_string() } else { value.into_owned() };
            (name.into_owned(), value)
        })
        .collect();
    let mut masked = url.clone();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fast_client(attempts: u32) -> HttpClient {
        HttpClient::builder()
            .backoff(Duration::from_millis(5), Duration::from_millis(20))
            .max_attempts(attempts)
            .build()
            .expect("http client")
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let policy = HttpClient::builder()
            .backoff(Duration::from_millis(100), Duration::from_millis(350))
            .build()
            .unwrap()
            .policy;

        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        assert_eq!(policy.delay(3), Duration::from_millis(350));
        assert_eq!(policy.delay(40), Duration::from_millis(350));
    }

    #[tokio::test]
    async fn get_sends_query_once_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("location", "101280101"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let response = fast_client(3)
            .get(&server.uri(), &[("location", "101280101")])
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_success() {
        let server = MockServer::start().await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        Mock::given(method("GET"))
            .respond_with(move |_req: &wiremock::Request| {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    ResponseTemplate::new(502)
                } else {
                    ResponseTemplate::new(200)
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let response = fast_client(3).get(&server.uri(), &[]).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn last_server_error_is_returned_as_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let response = fast_client(2).get(&server.uri(), &[]).await.expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn quota_responses_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let response = fast_client(3).get(&server.uri(), &[]).await.expect("response");
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn refused_connection_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = fast_client(2).get(&format!("http://{addr}"), &[]).await;
        assert!(matches!(result, Err(NimbusError::Network(_))), "got {result:?}");
    }

    #[test]
    fn redacts_api_key_in_logged_urls() {
        let url = reqwest::Url::parse("https://example.com/v7/weather/now?location=1&key=secret")
            .unwrap();
        let logged = redact(&url);
        assert!(!logged.contains("secret"));
        assert!(logged.contains("location=1"));
        assert!(logged.contains("key=***") || logged.contains("key=%2A%2A%2A"));
    }
}
