//! Run configuration, independent of where the values came from.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::sites::default_sites;
use crate::types::{ScanMode, Site};

/// Where and how to reach one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
    pub token: String,
}

impl BackendConfig {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DredgerConfig {
    /// `None` when the backend is disabled.
    pub mealie: Option<BackendConfig>,
    pub tandoor: Option<BackendConfig>,
    pub dry_run: bool,
    /// Loose language filter, see [`crate::filter::language_allowed`].
    pub language: String,
    /// Stop a site after this many successful imports.
    pub recipes_per_site: usize,
    /// Maximum candidate URLs taken from a site's sitemap.
    pub scan_depth: usize,
    pub sites: Vec<Site>,
    pub mode: ScanMode,
    /// Holds `imported.json` and `rejects.json`.
    pub data_dir: PathBuf,
    /// Pause after every successful import.
    pub import_delay: Duration,
    /// Randomise site and candidate order.
    pub shuffle: bool,
}

impl Default for DredgerConfig {
    fn default() -> Self {
        Self {
            mealie: None,
            tandoor: None,
            dry_run: true,
            language: "en".to_string(),
            recipes_per_site: 50,
            scan_depth: 1000,
            sites: default_sites(),
            mode: ScanMode::Local,
            data_dir: PathBuf::from("data"),
            import_delay: Duration::from_secs(2),
            shuffle: true,
        }
    }
}

impl DredgerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mode == ScanMode::Audit && self.mealie.is_none() {
            return Err(ConfigError::AuditWithoutMealie);
        }
        if !self.dry_run && self.mealie.is_none() && self.tandoor.is_none() {
            return Err(ConfigError::NoBackends);
        }
        Ok(())
    }
}

/// Parse a site list override. Blank entries are ignored.
pub fn parse_sites<S: AsRef<str>>(entries: &[S]) -> Result<Vec<Site>, ConfigError> {
    entries
        .iter()
        .map(|e| e.as_ref().trim())
        .filter(|e| !e.is_empty())
        .map(Site::parse)
        .collect()
}
