use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::error::ImportError;
use crate::http::HttpClient;
use crate::types::ImportOutcome;

use super::{log_outcome, Importer};

const IMPORT_PATH: &str = "/api/recipe/import-url/";

/// Tandoor backend. Tandoor has no distinct duplicate answer.
pub struct TandoorImporter {
    client: Arc<dyn HttpClient>,
    base_url: String,
    api_key: String,
}

impl TandoorImporter {
    pub fn new(client: Arc<dyn HttpClient>, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl Importer for TandoorImporter {
    fn name(&self) -> &'static str {
        "Tandoor"
    }

    async fn import(&self, url: &str) -> ImportOutcome {
        let endpoint = format!("{}{}", self.base_url, IMPORT_PATH);
        let outcome = match self
            .client
            .post_json(&endpoint, Some(&self.api_key), &json!({ "url": url }))
            .await
        {
            Ok(200) | Ok(201) => ImportOutcome::Created,
            Ok(status) => ImportOutcome::Failed(ImportError::Refused { status }),
            Err(e) => ImportOutcome::Failed(ImportError::Transport(e.to_string())),
        };
        log_outcome(self.name(), url, &outcome);
        outcome
    }
}
