//! In-memory [`HttpClient`] for tests.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::FetchError;

use super::client::HttpClient;

/// Canned response for a URL.
#[derive(Clone, Debug)]
pub enum MockResponse {
    Html(String),
    Bytes(Vec<u8>),
    Json(JsonValue),
    /// Answer with a bare status and an empty body.
    Status(u16),
    /// Fail without an answer, like a timeout or refused connection.
    Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    Probe,
    Get,
    Post,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    pub kind: RequestKind,
    pub url: String,
    pub bearer: Option<String>,
    pub body: Option<JsonValue>,
}

/// Mock HTTP client. Unknown URLs answer 404.
///
/// GET and HEAD share one response table; POST responses are kept apart so
/// a backend endpoint can be scripted independently of page content.
#[derive(Default)]
pub struct MockClient {
    responses: HashMap<String, MockResponse>,
    post_responses: HashMap<String, MockResponse>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: &str, response: MockResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    pub fn with_html(self, url: &str, html: &str) -> Self {
        self.with_response(url, MockResponse::Html(html.to_string()))
    }

    pub fn with_bytes(self, url: &str, bytes: Vec<u8>) -> Self {
        self.with_response(url, MockResponse::Bytes(bytes))
    }

    pub fn with_json(self, url: &str, json: JsonValue) -> Self {
        self.with_response(url, MockResponse::Json(json))
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.with_response(url, MockResponse::Status(status))
    }

    pub fn with_error(self, url: &str, error: &str) -> Self {
        self.with_response(url, MockResponse::Error(error.to_string()))
    }

    /// Script the status a POST to `url` answers with.
    pub fn with_post_status(mut self, url: &str, status: u16) -> Self {
        self.post_responses
            .insert(url.to_string(), MockResponse::Status(status));
        self
    }

    /// Make a POST to `url` fail without an answer.
    pub fn with_post_error(mut self, url: &str, error: &str) -> Self {
        self.post_responses
            .insert(url.to_string(), MockResponse::Error(error.to_string()));
        self
    }

    /// Every request made so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// How many requests of any kind touched `url`.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|r| r.url == url).count()
    }

    /// URLs that were POSTed to, in order.
    pub fn posted_urls(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.kind == RequestKind::Post)
            .map(|r| r.url)
            .collect()
    }

    fn record(&self, kind: RequestKind, url: &str, bearer: Option<&str>, body: Option<&JsonValue>) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                kind,
                url: url.to_string(),
                bearer: bearer.map(str::to_string),
                body: body.cloned(),
            });
        }
    }

    fn body_of(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        match self.responses.get(url) {
            Some(MockResponse::Html(html)) => Ok(html.as_bytes().to_vec()),
            Some(MockResponse::Bytes(bytes)) => Ok(bytes.clone()),
            Some(MockResponse::Json(json)) => Ok(json.to_string().into_bytes()),
            Some(MockResponse::Status(status)) if (200..300).contains(status) => Ok(Vec::new()),
            Some(MockResponse::Status(status)) => Err(FetchError::Status(*status)),
            Some(MockResponse::Error(e)) => Err(FetchError::Transport(e.clone())),
            None => Err(FetchError::Status(404)),
        }
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn probe(&self, url: &str) -> Result<u16, FetchError> {
        self.record(RequestKind::Probe, url, None, None);
        match self.responses.get(url) {
            Some(MockResponse::Status(status)) => Ok(*status),
            Some(MockResponse::Error(e)) => Err(FetchError::Transport(e.clone())),
            Some(_) => Ok(200),
            None => Ok(404),
        }
    }

    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        self.record(RequestKind::Get, url, None, None);
        let bytes = self.body_of(url)?;
        String::from_utf8(bytes).map_err(|e| FetchError::InvalidBody(e.to_string()))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.record(RequestKind::Get, url, None, None);
        self.body_of(url)
    }

    async fn get_json(&self, url: &str, bearer: Option<&str>) -> Result<JsonValue, FetchError> {
        self.record(RequestKind::Get, url, bearer, None);
        let bytes = self.body_of(url)?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::InvalidBody(e.to_string()))
    }

    async fn post_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &JsonValue,
    ) -> Result<u16, FetchError> {
        self.record(RequestKind::Post, url, bearer, Some(body));
        match self.post_responses.get(url) {
            Some(MockResponse::Status(status)) => Ok(*status),
            Some(MockResponse::Error(e)) => Err(FetchError::Transport(e.clone())),
            Some(_) => Ok(200),
            None => Ok(404),
        }
    }
}
