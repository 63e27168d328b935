//! HTTP transport for the pipeline.
//!
//! Every sitemap probe, page fetch and backend call goes through the
//! [`HttpClient`] trait so the pipeline can run against [`MockClient`]
//! in tests and [`PoliteClient`] in production.

mod client;
mod mock;
mod rate_limiter;

pub use client::{HttpClient, PoliteClient, PoliteClientBuilder, BROWSER_USER_AGENT};
pub use mock::{MockClient, MockResponse, RecordedRequest, RequestKind};
pub use rate_limiter::RateLimiter;

/// Host part of a URL, used as the rate limiting key.
pub fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_of() {
        assert_eq!(
            host_of("https://www.budgetbytes.com/sitemap.xml").as_deref(),
            Some("www.budgetbytes.com")
        );
        assert_eq!(host_of("not a url"), None);
    }
}
