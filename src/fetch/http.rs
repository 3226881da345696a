// src/fetch/http.rs
// =============================================================================
// Default PageFetcher: plain HTTP GET through reqwest.
//
// Key behavior:
// - Up to `attempts` tries per URL with a short jittered pause in between
// - When a proxy pool is attached, each try goes through a random proxy
// - Non-2xx responses and transport errors are classified and logged at
//   debug level; the caller only sees `None`
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use tracing::debug;

use crate::error::Result;
use crate::fetch::{PageFetcher, ProxyPool};

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) site-spider/0.1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_ATTEMPTS: u32 = 3;
const RETRY_PAUSE_MS: u64 = 500;

/// Why a single fetch attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    /// Server answered with a non-success status
    #[error("HTTP {0}")]
    Status(u16),
    /// Request timed out
    #[error("timed out")]
    Timeout,
    /// Could not connect (DNS, refused, proxy down)
    #[error("connection failed")]
    Connect,
    /// Too many redirects
    #[error("too many redirects")]
    Redirect,
    /// Anything else, including body decoding
    #[error("{0}")]
    Other(String),
}

impl FetchFailure {
    fn from_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchFailure::Timeout
        } else if error.is_connect() {
            FetchFailure::Connect
        } else if error.is_redirect() {
            FetchFailure::Redirect
        } else {
            FetchFailure::Other(error.to_string())
        }
    }

    // 4xx won't improve on retry; everything else might
    fn is_permanent(&self) -> bool {
        matches!(self, FetchFailure::Status(code) if (400..500).contains(code))
    }
}

pub struct HttpFetcher {
    direct: Client,
    proxies: Option<Arc<ProxyPool>>,
    attempts: u32,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            direct: build_client(None)?,
            proxies: None,
            attempts: DEFAULT_ATTEMPTS,
        })
    }

    pub fn with_proxies(mut self, proxies: Arc<ProxyPool>) -> Self {
        self.proxies = Some(proxies);
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    async fn client(&self) -> Client {
        match &self.proxies {
            Some(pool) => pool.pick().await.unwrap_or_else(|| self.direct.clone()),
            None => self.direct.clone(),
        }
    }

    async fn attempt(&self, url: &str) -> std::result::Result<String, FetchFailure> {
        let client = self.client().await;
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchFailure::from_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchFailure::from_error(&e))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        for attempt in 1..=self.attempts {
            match self.attempt(url).await {
                Ok(body) if !body.is_empty() => return Some(body),
                Ok(_) => {
                    debug!(url, attempt, "empty body");
                }
                Err(failure) => {
                    debug!(url, attempt, %failure, "fetch attempt failed");
                    if failure.is_permanent() {
                        return None;
                    }
                }
            }

            if attempt < self.attempts {
                let pause = rand::thread_rng().gen_range(0..=RETRY_PAUSE_MS);
                tokio::time::sleep(Duration::from_millis(pause)).await;
            }
        }
        None
    }
}

pub(crate) fn build_client(proxy: Option<reqwest::Proxy>) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(5));
    if let Some(proxy) = proxy {
        builder = builder.proxy(proxy);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/p/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h1>hi</h1>"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let body = fetcher.fetch(&format!("{}/p/1", server.uri())).await;
        assert_eq!(body.as_deref(), Some("<h1>hi</h1>"));
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/p/404"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        assert_eq!(fetcher.fetch(&format!("{}/p/404", server.uri())).await, None);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_then_given_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap().with_attempts(2);
        assert_eq!(fetcher.fetch(&format!("{}/flaky", server.uri())).await, None);
    }

    #[test]
    fn test_failures_read_as_log_text() {
        assert_eq!(FetchFailure::Status(503).to_string(), "HTTP 503");
        assert_eq!(FetchFailure::Redirect.to_string(), "too many redirects");
        assert_eq!(
            FetchFailure::Other("error decoding response body".into()).to_string(),
            "error decoding response body"
        );
    }

    #[test]
    fn test_permanent_failures() {
        assert!(FetchFailure::Status(404).is_permanent());
        assert!(!FetchFailure::Status(503).is_permanent());
        assert!(!FetchFailure::Timeout.is_permanent());
    }
}
