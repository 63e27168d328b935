use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

use crate::error::{ConfigError, ImportError};

/// A food blog to dredge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Base URL without a trailing slash, e.g. `https://www.budgetbytes.com`.
    pub base_url: String,
    /// Full sitemap URL when known up front; discovered otherwise.
    pub sitemap_url: Option<String>,
}

impl Site {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            sitemap_url: None,
        }
    }

    /// Parse a configured site entry.
    ///
    /// An entry pointing at an `.xml` / `.xml.gz` document is taken as the
    /// site's sitemap, with the origin as base URL.
    pub fn parse(entry: &str) -> Result<Self, ConfigError> {
        let entry = entry.trim();
        let parsed = url::Url::parse(entry).map_err(|e| ConfigError::InvalidSite {
            url: entry.to_string(),
            message: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ConfigError::InvalidSite {
                url: entry.to_string(),
                message: "expected an http(s) URL with a host".to_string(),
            });
        }

        let path = parsed.path().to_ascii_lowercase();
        if path.ends_with(".xml") || path.ends_with(".xml.gz") {
            let origin = parsed.origin().ascii_serialization();
            return Ok(Self {
                base_url: origin,
                sitemap_url: Some(entry.to_string()),
            });
        }

        Ok(Self::new(entry))
    }

    pub fn host(&self) -> &str {
        self.base_url
            .split("://")
            .nth(1)
            .unwrap_or(&self.base_url)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url)
    }
}

/// Structured recipe data found on a page, kept as the raw schema.org object.
///
/// Fields are not validated; the backend re-scrapes the page itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeRecord(Map<String, JsonValue>);

impl RecipeRecord {
    pub fn new(fields: Map<String, JsonValue>) -> Self {
        Self(fields)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(|v| v.as_str())
    }

    /// Declared `inLanguage`, either a plain string or a Language object.
    pub fn language(&self) -> Option<&str> {
        match self.0.get("inLanguage")? {
            JsonValue::String(s) => Some(s.as_str()),
            JsonValue::Object(obj) => obj
                .get("alternateName")
                .or_else(|| obj.get("name"))
                .and_then(|v| v.as_str()),
            _ => None,
        }
    }
}

/// Result of pushing one URL to a backend (or to all of them).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Created,
    /// The backend already had it. Counts as imported; never retried.
    Duplicate,
    Failed(ImportError),
}

impl ImportOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ImportOutcome::Created | ImportOutcome::Duplicate)
    }
}

/// Which dedup baseline a run trusts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Trust the local imported/rejected files and extract full JSON-LD.
    #[default]
    Local,
    /// Rebuild the baseline from the Mealie listing and accept pages on
    /// weaker recipe markers.
    Audit,
}

impl std::str::FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(ScanMode::Local),
            "audit" | "weekly" => Ok(ScanMode::Audit),
            other => Err(format!("unknown scan mode {other:?} (expected local or audit)")),
        }
    }
}

/// Per-site counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteReport {
    pub site: String,
    pub sitemap_url: Option<String>,
    pub candidates: usize,
    /// Already imported, rejected, or known to the backend.
    pub known: usize,
    /// Rejected by URL or title heuristics.
    pub filtered: usize,
    pub not_recipe: usize,
    pub unreachable: usize,
    pub language_skipped: usize,
    pub imported: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub quota_reached: bool,
}

impl SiteReport {
    pub fn new(site: &Site) -> Self {
        Self {
            site: site.base_url.clone(),
            ..Default::default()
        }
    }

    /// Successful imports, duplicates included. This is what the quota counts.
    pub fn accepted(&self) -> usize {
        self.imported + self.duplicates
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub sites: Vec<SiteReport>,
}

impl RunReport {
    pub fn total_imported(&self) -> usize {
        self.sites.iter().map(|s| s.imported).sum()
    }

    pub fn total_duplicates(&self) -> usize {
        self.sites.iter().map(|s| s.duplicates).sum()
    }

    pub fn total_rejected(&self) -> usize {
        self.sites.iter().map(|s| s.filtered + s.not_recipe).sum()
    }

    pub fn sites_without_candidates(&self) -> usize {
        self.sites.iter().filter(|s| s.candidates == 0).count()
    }
}
