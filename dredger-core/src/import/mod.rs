//! Delivery of confirmed recipe URLs to recipe managers.

mod mealie;
mod tandoor;

pub use mealie::MealieImporter;
pub use tandoor::TandoorImporter;

use async_trait::async_trait;

use crate::error::ImportError;
use crate::types::ImportOutcome;

/// A backend that can import a recipe given only its URL.
#[async_trait]
pub trait Importer: Send + Sync {
    /// Short name for logs, e.g. "Mealie".
    fn name(&self) -> &'static str;

    async fn import(&self, url: &str) -> ImportOutcome;
}

/// Fans a URL out to every enabled backend.
pub struct Dispatcher {
    importers: Vec<Box<dyn Importer>>,
    dry_run: bool,
}

impl Dispatcher {
    pub fn new(importers: Vec<Box<dyn Importer>>, dry_run: bool) -> Self {
        Self { importers, dry_run }
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.importers.iter().map(|i| i.name()).collect()
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Try every backend. Any `Created` wins, then any `Duplicate`. A
    /// failure is only reported when every backend failed, and counts as a
    /// refusal only if every backend answered with a refusal.
    pub async fn dispatch(&self, url: &str) -> ImportOutcome {
        if self.dry_run {
            tracing::info!(url, "[dry run] would import");
            return ImportOutcome::Created;
        }

        if self.importers.is_empty() {
            return ImportOutcome::Failed(ImportError::NoBackends);
        }

        let mut outcomes = Vec::with_capacity(self.importers.len());
        for importer in &self.importers {
            outcomes.push(importer.import(url).await);
        }
        combine(outcomes)
    }
}

fn combine(outcomes: Vec<ImportOutcome>) -> ImportOutcome {
    if outcomes.contains(&ImportOutcome::Created) {
        return ImportOutcome::Created;
    }
    if outcomes.contains(&ImportOutcome::Duplicate) {
        return ImportOutcome::Duplicate;
    }

    let mut errors = outcomes.into_iter().filter_map(|o| match o {
        ImportOutcome::Failed(e) => Some(e),
        _ => None,
    });
    let first = errors.next().unwrap_or(ImportError::NoBackends);
    if !first.is_refusal() {
        return ImportOutcome::Failed(first);
    }
    match errors.find(|e| !e.is_refusal()) {
        Some(transport) => ImportOutcome::Failed(transport),
        None => ImportOutcome::Failed(first),
    }
}

/// One log line per backend attempt.
pub(crate) fn log_outcome(backend: &str, url: &str, outcome: &ImportOutcome) {
    match outcome {
        ImportOutcome::Created => tracing::info!(backend, url, "imported"),
        ImportOutcome::Duplicate => tracing::info!(backend, url, "duplicate"),
        ImportOutcome::Failed(e) => tracing::error!(backend, url, error = %e, "import failed"),
    }
}
