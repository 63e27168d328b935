use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ConfigError, FetchError, ImportError};
use crate::http::HttpClient;
use crate::types::ImportOutcome;

use super::{log_outcome, Importer};

const CREATE_PATH: &str = "/api/recipes/create-url";
/// Older Mealie releases only expose this one.
const LEGACY_CREATE_PATH: &str = "/api/recipes/create/url";
const LIST_PATH: &str = "/api/recipes";
const LIST_PAGE_SIZE: usize = 1000;

#[derive(Debug, Deserialize)]
struct RecipePage {
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    items: Vec<RecipeSummary>,
}

#[derive(Debug, Deserialize)]
struct RecipeSummary {
    #[serde(rename = "orgURL", default)]
    org_url: Option<String>,
    #[serde(rename = "originalURL", default)]
    original_url: Option<String>,
}

/// Mealie backend.
pub struct MealieImporter {
    client: Arc<dyn HttpClient>,
    base_url: String,
    token: String,
}

impl MealieImporter {
    pub fn new(client: Arc<dyn HttpClient>, base_url: &str, token: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn list_url(&self, page: usize, per_page: usize) -> String {
        format!("{}{}?page={}&perPage={}", self.base_url, LIST_PATH, page, per_page)
    }

    /// Every source URL Mealie already holds.
    ///
    /// The first call is a reachability check and any failure there is
    /// fatal: without a trustworthy baseline the run would re-import
    /// everything. Later pages stop the listing quietly on error.
    pub async fn list_source_urls(&self) -> Result<HashSet<String>, ConfigError> {
        let check_url = self.list_url(1, 1);
        let first = self
            .client
            .get_json(&check_url, Some(&self.token))
            .await
            .and_then(|json| {
                serde_json::from_value::<RecipePage>(json)
                    .map_err(|e| FetchError::InvalidBody(e.to_string()))
            })
            .map_err(|source| ConfigError::BackendUnreachable {
                url: check_url.clone(),
                source,
            })?;
        tracing::info!(expected = first.total.unwrap_or(0), "downloading Mealie index");

        let mut urls = HashSet::new();
        let mut page = 1;
        loop {
            let url = self.list_url(page, LIST_PAGE_SIZE);
            let items = match self.client.get_json(&url, Some(&self.token)).await {
                Ok(json) => match serde_json::from_value::<RecipePage>(json) {
                    Ok(listing) => listing.items,
                    Err(e) => {
                        tracing::warn!(url, error = %e, "unexpected listing page, stopping");
                        break;
                    }
                },
                Err(e) => {
                    tracing::warn!(url, error = %e, "listing page failed, stopping");
                    break;
                }
            };
            if items.is_empty() {
                break;
            }

            for item in items {
                urls.extend(item.org_url.into_iter().filter(|u| !u.is_empty()));
                urls.extend(item.original_url.into_iter().filter(|u| !u.is_empty()));
            }
            tracing::debug!(page, found = urls.len(), "scanned listing page");
            page += 1;
        }

        tracing::info!(count = urls.len(), "Mealie index loaded");
        Ok(urls)
    }
}

impl MealieImporter {
    async fn create(&self, path: &str, body: &serde_json::Value) -> Result<u16, FetchError> {
        let endpoint = format!("{}{}", self.base_url, path);
        self.client.post_json(&endpoint, Some(&self.token), body).await
    }
}

#[async_trait]
impl Importer for MealieImporter {
    fn name(&self) -> &'static str {
        "Mealie"
    }

    async fn import(&self, url: &str) -> ImportOutcome {
        let body = json!({ "url": url });
        let mut response = self.create(CREATE_PATH, &body).await;
        if matches!(response, Ok(404)) {
            tracing::debug!(url, "create-url endpoint missing, trying legacy path");
            response = self.create(LEGACY_CREATE_PATH, &body).await;
        }

        let outcome = match response {
            Ok(201) => ImportOutcome::Created,
            Ok(409) => ImportOutcome::Duplicate,
            Ok(status) => ImportOutcome::Failed(ImportError::Refused { status }),
            Err(e) => ImportOutcome::Failed(ImportError::Transport(e.to_string())),
        };
        log_outcome(self.name(), url, &outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockClient;

    const BASE: &str = "http://mealie.test:9000";
    const CREATE: &str = "http://mealie.test:9000/api/recipes/create-url";

    fn importer(client: MockClient) -> (Arc<MockClient>, MealieImporter) {
        let client = Arc::new(client);
        let importer = MealieImporter::new(client.clone(), &format!("{BASE}/"), "secret");
        (client, importer)
    }

    #[tokio::test]
    async fn test_status_mapping() {
        for (status, expected) in [
            (201, ImportOutcome::Created),
            (409, ImportOutcome::Duplicate),
            (500, ImportOutcome::Failed(ImportError::Refused { status: 500 })),
        ] {
            let (client, mealie) = importer(MockClient::new().with_post_status(CREATE, status));
            assert_eq!(mealie.import("https://a.com/soup").await, expected);

            let request = &client.requests()[0];
            assert_eq!(request.bearer.as_deref(), Some("secret"));
            assert_eq!(request.body, Some(json!({"url": "https://a.com/soup"})));
        }
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let (_, mealie) = importer(MockClient::new().with_post_error(CREATE, "refused"));
        assert!(matches!(
            mealie.import("https://a.com/soup").await,
            ImportOutcome::Failed(ImportError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_falls_back_to_legacy_create_path() {
        let legacy = format!("{BASE}/api/recipes/create/url");
        let (client, mealie) = importer(MockClient::new().with_post_status(&legacy, 201));

        assert_eq!(mealie.import("https://a.com/soup").await, ImportOutcome::Created);
        assert_eq!(client.posted_urls(), vec![CREATE.to_string(), legacy]);

        let (client, mealie) = importer(MockClient::new().with_post_status(CREATE, 201));
        mealie.import("https://a.com/soup").await;
        assert_eq!(client.posted_urls(), vec![CREATE]);
    }

    #[tokio::test]
    async fn test_listing_reads_until_empty_page() {
        let client = MockClient::new()
            .with_json(&format!("{BASE}/api/recipes?page=1&perPage=1"), json!({"total": 3, "items": [{}]}))
            .with_json(
                &format!("{BASE}/api/recipes?page=1&perPage=1000"),
                json!({"total": 3, "items": [
                    {"orgURL": "https://a.com/soup"},
                    {"originalURL": "https://b.com/stew", "orgURL": null}
                ]}),
            )
            .with_json(
                &format!("{BASE}/api/recipes?page=2&perPage=1000"),
                json!({"total": 3, "items": [{"orgURL": "https://c.com/pie", "originalURL": ""}]}),
            )
            .with_json(&format!("{BASE}/api/recipes?page=3&perPage=1000"), json!({"items": []}));
        let (client, mealie) = importer(client);

        let urls = mealie.list_source_urls().await.unwrap();
        assert_eq!(urls.len(), 3);
        assert!(urls.contains("https://b.com/stew"));
        assert_eq!(client.request_count(&format!("{BASE}/api/recipes?page=4&perPage=1000")), 0);
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let (_, unauthorized) = importer(
            MockClient::new().with_status(&format!("{BASE}/api/recipes?page=1&perPage=1"), 401),
        );
        assert!(matches!(
            unauthorized.list_source_urls().await,
            Err(ConfigError::BackendUnreachable { .. })
        ));

        let (_, down) = importer(
            MockClient::new().with_error(&format!("{BASE}/api/recipes?page=1&perPage=1"), "refused"),
        );
        assert!(down.list_source_urls().await.is_err());
    }
}
