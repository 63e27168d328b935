//! Drives discovery, filtering, extraction and import across all sites.
//!
//! Sites are processed one at a time and candidates one at a time. The
//! dedup store is flushed after every site, so an interrupted run loses at
//! most the site in flight.

use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::config::DredgerConfig;
use crate::dedup::DedupStore;
use crate::error::{ConfigError, ImportError};
use crate::extract::{Evidence, PageOutcome, RecipeExtractor};
use crate::filter;
use crate::http::HttpClient;
use crate::import::{Dispatcher, Importer, MealieImporter, TandoorImporter};
use crate::sitemap::SitemapResolver;
use crate::types::{ImportOutcome, RunReport, ScanMode, Site, SiteReport};

pub struct Orchestrator {
    client: Arc<dyn HttpClient>,
    config: DredgerConfig,
    dispatcher: Dispatcher,
    /// Kept separately for the audit-mode listing.
    mealie: Option<MealieImporter>,
    store: DedupStore,
}

impl Orchestrator {
    /// Validate the configuration, wire up the backends and load the
    /// dedup state from `config.data_dir`.
    pub fn new(config: DredgerConfig, client: Arc<dyn HttpClient>) -> Result<Self, ConfigError> {
        let store = DedupStore::open(&config.data_dir);
        Self::with_store(config, client, store)
    }

    pub fn with_store(
        config: DredgerConfig,
        client: Arc<dyn HttpClient>,
        store: DedupStore,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut importers: Vec<Box<dyn Importer>> = Vec::new();
        if let Some(mealie) = &config.mealie {
            importers.push(Box::new(MealieImporter::new(
                Arc::clone(&client),
                &mealie.base_url,
                &mealie.token,
            )));
        }
        if let Some(tandoor) = &config.tandoor {
            importers.push(Box::new(TandoorImporter::new(
                Arc::clone(&client),
                &tandoor.base_url,
                &tandoor.token,
            )));
        }

        let mealie = config
            .mealie
            .as_ref()
            .map(|m| MealieImporter::new(Arc::clone(&client), &m.base_url, &m.token));

        Ok(Self {
            dispatcher: Dispatcher::new(importers, config.dry_run),
            mealie,
            client,
            config,
            store,
        })
    }

    pub fn store(&self) -> &DedupStore {
        &self.store
    }

    /// Process every configured site.
    ///
    /// The only error is a failed audit baseline; everything else is
    /// contained to the URL or site it happened on.
    pub async fn run(&mut self) -> Result<RunReport, ConfigError> {
        let mode = if self.dispatcher.is_dry_run() { "DRY RUN" } else { "LIVE IMPORT" };
        tracing::info!(
            mode,
            scan = ?self.config.mode,
            backends = ?self.dispatcher.backend_names(),
            imported = self.store.imported_count(),
            rejected = self.store.rejected_count(),
            "recipe dredger started"
        );

        if self.config.mode == ScanMode::Audit {
            let mealie = self.mealie.as_ref().ok_or(ConfigError::AuditWithoutMealie)?;
            let known = mealie.list_source_urls().await?;
            self.store.bulk_load_remote(known);
        }

        let mut sites = self.config.sites.clone();
        if self.config.shuffle {
            sites.shuffle(&mut rand::rng());
        }

        let mut report = RunReport::default();
        for site in &sites {
            let site_report = self.process_site(site).await;
            if let Err(e) = self.store.flush() {
                tracing::error!(site = %site, error = %e, "failed to save dedup state");
            }
            report.sites.push(site_report);
        }

        tracing::info!(
            sites = report.sites.len(),
            imported = report.total_imported(),
            duplicates = report.total_duplicates(),
            rejected = report.total_rejected(),
            "dredge cycle complete"
        );
        Ok(report)
    }

    /// Scan one site until its sitemap is exhausted or the quota is met.
    pub async fn process_site(&mut self, site: &Site) -> SiteReport {
        tracing::info!(site = %site, "processing site");
        let mut report = SiteReport::new(site);

        let client = Arc::clone(&self.client);
        let resolver = SitemapResolver::new(client.as_ref(), self.config.scan_depth);
        let (sitemap_url, mut candidates) = resolver.resolve(site).await;
        report.sitemap_url = sitemap_url;
        report.candidates = candidates.len();

        if report.sitemap_url.is_none() {
            tracing::warn!(site = %site, "no sitemap found");
            return report;
        }
        if candidates.is_empty() {
            tracing::warn!(site = %site, "sitemap listed no candidates");
            return report;
        }

        if self.config.shuffle {
            candidates.shuffle(&mut rand::rng());
        }

        let evidence = match self.config.mode {
            ScanMode::Local => Evidence::StructuredData,
            ScanMode::Audit => Evidence::Marker,
        };
        let extractor = RecipeExtractor::new(client.as_ref(), evidence);

        for url in &candidates {
            if report.accepted() >= self.config.recipes_per_site {
                tracing::info!(site = %site, "target reached");
                report.quota_reached = true;
                break;
            }

            if self.store.should_skip(url) {
                report.known += 1;
                continue;
            }

            if let Some(reason) = filter::check_url(url) {
                tracing::debug!(url = %url, %reason, "skipped before fetch");
                self.store.record_rejected(url);
                report.filtered += 1;
                continue;
            }

            match extractor.check(url).await {
                PageOutcome::Unreachable(_) => report.unreachable += 1,
                PageOutcome::NotRecipe => {
                    tracing::debug!(url = %url, "no recipe found");
                    self.store.record_rejected(url);
                    report.not_recipe += 1;
                }
                PageOutcome::Skipped(_) => {
                    self.store.record_rejected(url);
                    report.filtered += 1;
                }
                PageOutcome::Recipe(record) => {
                    if !filter::language_allowed(&self.config.language, record.language()) {
                        tracing::debug!(url = %url, language = ?record.language(), "skipping language");
                        report.language_skipped += 1;
                        continue;
                    }
                    self.import(url, &mut report).await;
                }
                PageOutcome::RecipeMarker => self.import(url, &mut report).await,
            }
        }

        tracing::info!(
            site = %site,
            candidates = report.candidates,
            imported = report.imported,
            duplicates = report.duplicates,
            rejected = report.filtered + report.not_recipe,
            "site done"
        );
        report
    }

    async fn import(&mut self, url: &str, report: &mut SiteReport) {
        match self.dispatcher.dispatch(url).await {
            ImportOutcome::Created => {
                self.store.record_imported(url);
                report.imported += 1;
                self.pause().await;
            }
            ImportOutcome::Duplicate => {
                self.store.record_imported(url);
                report.duplicates += 1;
                self.pause().await;
            }
            ImportOutcome::Failed(ImportError::Refused { status }) => {
                tracing::debug!(url, status, "every backend refused, rejecting");
                self.store.record_rejected(url);
                report.failed += 1;
            }
            ImportOutcome::Failed(_) => report.failed += 1,
        }
    }

    async fn pause(&self) {
        if !self.config.import_delay.is_zero() {
            tokio::time::sleep(self.config.import_delay).await;
        }
    }
}
