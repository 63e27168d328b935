//! HTTP client trait and the production implementation.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::error::FetchError;

use super::host_of;
use super::rate_limiter::RateLimiter;

/// Browser-like user agent; several blogs answer 403 to obvious bots.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Everything the pipeline needs from the network.
///
/// Non-2xx responses are reported as [`FetchError::Status`] by the fetch
/// methods; `probe` and `post_json` hand the status back instead because
/// their callers branch on it.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Lightweight existence check (HEAD). Returns the status code.
    async fn probe(&self, url: &str) -> Result<u16, FetchError>;

    /// Fetch a page or sitemap as text.
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError>;

    /// Fetch raw bytes (gzipped sitemaps).
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// GET a JSON document from a backend API.
    async fn get_json(&self, url: &str, bearer: Option<&str>) -> Result<JsonValue, FetchError>;

    /// POST a JSON body to a backend API. Returns the status code.
    async fn post_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &JsonValue,
    ) -> Result<u16, FetchError>;
}

/// Configuration for [`PoliteClient`].
#[derive(Clone)]
pub struct PoliteClientBuilder {
    probe_timeout: Duration,
    fetch_timeout: Duration,
    api_timeout: Duration,
    per_host_delay: Duration,
    user_agent: String,
}

impl Default for PoliteClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PoliteClientBuilder {
    pub fn new() -> Self {
        Self {
            probe_timeout: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(15),
            api_timeout: Duration::from_secs(20),
            per_host_delay: Duration::from_millis(500),
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }

    /// Timeout for sitemap existence probes.
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Timeout for sitemap and page fetches.
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Timeout for backend import and listing calls.
    pub fn api_timeout(mut self, timeout: Duration) -> Self {
        self.api_timeout = timeout;
        self
    }

    /// Minimum gap between content fetches to one host. Zero disables it.
    pub fn per_host_delay(mut self, delay: Duration) -> Self {
        self.per_host_delay = delay;
        self
    }

    pub fn user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn build(self) -> Result<PoliteClient, reqwest::Error> {
        let inner = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .build()?;

        Ok(PoliteClient {
            inner,
            rate_limiter: RateLimiter::new(self.per_host_delay),
            probe_timeout: self.probe_timeout,
            fetch_timeout: self.fetch_timeout,
            api_timeout: self.api_timeout,
        })
    }
}

/// Production client: reqwest with per-request timeouts and per-host spacing.
pub struct PoliteClient {
    inner: reqwest::Client,
    rate_limiter: RateLimiter,
    probe_timeout: Duration,
    fetch_timeout: Duration,
    api_timeout: Duration,
}

impl PoliteClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        PoliteClientBuilder::new().build()
    }

    pub fn builder() -> PoliteClientBuilder {
        PoliteClientBuilder::new()
    }

    fn parse(url: &str) -> Result<reqwest::Url, FetchError> {
        reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))
    }

    async fn throttle(&self, url: &str) {
        if let Some(host) = host_of(url) {
            self.rate_limiter.wait(&host).await;
        }
    }

    async fn get_success(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let parsed = Self::parse(url)?;
        self.throttle(url).await;

        tracing::debug!(url, "network: fetching");
        let response = self
            .inner
            .get(parsed)
            .timeout(self.fetch_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url, %status, "network: request failed");
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl HttpClient for PoliteClient {
    async fn probe(&self, url: &str) -> Result<u16, FetchError> {
        let parsed = Self::parse(url)?;
        self.throttle(url).await;

        let response = self
            .inner
            .head(parsed)
            .timeout(self.probe_timeout)
            .send()
            .await?;
        tracing::debug!(url, status = %response.status(), "network: probed");
        Ok(response.status().as_u16())
    }

    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        // reqwest decodes using the charset from Content-Type.
        Ok(self.get_success(url).await?.text().await?)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Ok(self.get_success(url).await?.bytes().await?.to_vec())
    }

    async fn get_json(&self, url: &str, bearer: Option<&str>) -> Result<JsonValue, FetchError> {
        let mut request = self.inner.get(Self::parse(url)?).timeout(self.api_timeout);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url, %status, "api: listing request failed");
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json::<JsonValue>()
            .await
            .map_err(|e| FetchError::InvalidBody(e.to_string()))
    }

    async fn post_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &JsonValue,
    ) -> Result<u16, FetchError> {
        let mut request = self
            .inner
            .post(Self::parse(url)?)
            .timeout(self.api_timeout)
            .json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        tracing::debug!(url, status = %response.status(), "api: posted");
        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = PoliteClient::builder();
        assert_eq!(builder.probe_timeout, Duration::from_secs(5));
        assert_eq!(builder.fetch_timeout, Duration::from_secs(15));
        assert_eq!(builder.api_timeout, Duration::from_secs(20));
        assert_eq!(builder.per_host_delay, Duration::from_millis(500));
        assert_eq!(builder.user_agent, BROWSER_USER_AGENT);
    }

    #[test]
    fn test_builder_settings_reach_client() {
        let client = PoliteClient::builder()
            .probe_timeout(Duration::from_secs(1))
            .fetch_timeout(Duration::from_secs(2))
            .api_timeout(Duration::from_secs(3))
            .per_host_delay(Duration::ZERO)
            .user_agent("dredger-test/1.0".to_string())
            .build()
            .unwrap();

        assert_eq!(client.probe_timeout, Duration::from_secs(1));
        assert_eq!(client.fetch_timeout, Duration::from_secs(2));
        assert_eq!(client.api_timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_sending() {
        let client = PoliteClient::builder()
            .per_host_delay(Duration::ZERO)
            .build()
            .unwrap();
        let err = client.fetch_html("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
        assert_eq!(client.rate_limiter.tracked_hosts(), 0);
    }
}
