use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use dredger_core::config::{parse_sites, BackendConfig, DredgerConfig};
use dredger_core::http::{PoliteClient, PoliteClientBuilder, BROWSER_USER_AGENT};
use dredger_core::orchestrator::Orchestrator;
use dredger_core::sites::default_sites;
use dredger_core::types::{RunReport, ScanMode};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "recipe-dredger")]
#[command(about = "Find recipes on food blogs and import them into Mealie or Tandoor", long_about = None)]
struct Cli {
    /// Import into Mealie
    #[arg(long, env = "MEALIE_ENABLED", default_value_t = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    mealie_enabled: bool,

    /// Mealie base URL
    #[arg(long, env = "MEALIE_URL", default_value = "http://localhost:9000")]
    mealie_url: Option<String>,

    #[arg(long, env = "MEALIE_API_TOKEN", hide_env_values = true)]
    mealie_api_token: Option<String>,

    /// Import into Tandoor
    #[arg(long, env = "TANDOOR_ENABLED", default_value_t = false, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    tandoor_enabled: bool,

    /// Tandoor base URL
    #[arg(long, env = "TANDOOR_URL", default_value = "http://localhost:8080")]
    tandoor_url: Option<String>,

    #[arg(long, env = "TANDOOR_API_KEY", hide_env_values = true)]
    tandoor_api_key: Option<String>,

    /// Log what would be imported without calling any backend
    #[arg(long, env = "DRY_RUN", default_value_t = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    dry_run: bool,

    /// Only import recipes in this language
    #[arg(long, env = "SCRAPE_LANG", default_value = "en")]
    scrape_lang: String,

    /// Stop a site after this many imports
    #[arg(long, env = "TARGET_RECIPES_PER_SITE", default_value_t = 50)]
    target_recipes_per_site: usize,

    /// Maximum URLs taken from one site's sitemap
    #[arg(long, env = "SCAN_DEPTH", default_value_t = 1000)]
    scan_depth: usize,

    /// Comma-separated site list, replacing the built-in one
    #[arg(long, env = "SITES", value_delimiter = ',')]
    sites: Vec<String>,

    /// Directory holding imported.json and rejects.json
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Seconds to wait after each import
    #[arg(long, env = "IMPORT_DELAY_SECS", default_value_t = 2)]
    import_delay_secs: u64,

    /// local: trust the local dedup files. audit: rebuild from the Mealie library
    #[arg(long, env = "DREDGE_MODE", default_value = "local")]
    mode: ScanMode,

    /// Used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Visit sites and sitemap entries in listed order
    #[arg(long, env = "NO_SHUFFLE")]
    no_shuffle: bool,

    /// Minimum gap between requests to one host
    #[arg(long, env = "PER_HOST_DELAY_MS", default_value_t = 500)]
    per_host_delay_ms: u64,

    #[arg(long, env = "PROBE_TIMEOUT_SECS", default_value_t = 5)]
    probe_timeout_secs: u64,

    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 15)]
    fetch_timeout_secs: u64,

    /// Timeout for Mealie and Tandoor API calls
    #[arg(long, env = "API_TIMEOUT_SECS", default_value_t = 20)]
    api_timeout_secs: u64,

    #[arg(long, env = "USER_AGENT", default_value = BROWSER_USER_AGENT)]
    user_agent: String,
}

impl Cli {
    fn client_builder(&self) -> PoliteClientBuilder {
        PoliteClient::builder()
            .per_host_delay(Duration::from_millis(self.per_host_delay_ms))
            .probe_timeout(Duration::from_secs(self.probe_timeout_secs))
            .fetch_timeout(Duration::from_secs(self.fetch_timeout_secs))
            .api_timeout(Duration::from_secs(self.api_timeout_secs))
            .user_agent(self.user_agent.clone())
    }

    fn into_config(self) -> Result<DredgerConfig> {
        let mealie = if self.mealie_enabled {
            Some(backend("Mealie", self.mealie_url, self.mealie_api_token)?)
        } else {
            None
        };
        let tandoor = if self.tandoor_enabled {
            Some(backend("Tandoor", self.tandoor_url, self.tandoor_api_key)?)
        } else {
            None
        };

        let sites = if self.sites.iter().all(|s| s.trim().is_empty()) {
            default_sites()
        } else {
            parse_sites(&self.sites).context("Invalid SITES entry")?
        };

        Ok(DredgerConfig {
            mealie,
            tandoor,
            dry_run: self.dry_run,
            language: self.scrape_lang,
            recipes_per_site: self.target_recipes_per_site,
            scan_depth: self.scan_depth,
            sites,
            mode: self.mode,
            data_dir: self.data_dir,
            import_delay: Duration::from_secs(self.import_delay_secs),
            shuffle: !self.no_shuffle,
        })
    }
}

fn backend(name: &str, url: Option<String>, token: Option<String>) -> Result<BackendConfig> {
    let Some(url) = url.filter(|u| !u.trim().is_empty()) else {
        bail!("{} is enabled but no URL is configured", name);
    };
    Ok(BackendConfig::new(&url, &token.unwrap_or_default()))
}

fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn print_summary(report: &RunReport) {
    tracing::info!(
        sites = report.sites.len(),
        imported = report.total_imported(),
        duplicates = report.total_duplicates(),
        rejected = report.total_rejected(),
        "run finished"
    );

    println!();
    println!("Dredge Results");
    println!("==============");
    println!("Sites:      {}", report.sites.len());
    println!("Imported:   {}", report.total_imported());
    println!("Duplicates: {}", report.total_duplicates());
    println!("Rejected:   {}", report.total_rejected());
    if report.sites_without_candidates() > 0 {
        println!("Sites with no candidates: {}", report.sites_without_candidates());
    }
    println!();

    for site in &report.sites {
        println!(
            "  {:<40} {:>5} candidates  {:>3} imported  {:>3} dup  {:>4} rejected  {:>3} unreachable{}",
            site.site,
            site.candidates,
            site.imported,
            site.duplicates,
            site.filtered + site.not_recipe,
            site.unreachable,
            if site.quota_reached { "  (target reached)" } else { "" }
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let client = cli
        .client_builder()
        .build()
        .context("Failed to build HTTP client")?;
    let config = cli.into_config()?;

    let mut orchestrator =
        Orchestrator::new(config, Arc::new(client)).context("Invalid configuration")?;
    let report = orchestrator.run().await.context("Dredge aborted")?;

    print_summary(&report);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["recipe-dredger"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_no_arguments_is_a_dry_run() {
        let config = parse(&[]).into_config().unwrap();

        assert!(config.dry_run);
        assert_eq!(
            config.mealie.as_ref().map(|m| m.base_url.clone()),
            Some("http://localhost:9000".to_string())
        );
        assert!(config.tandoor.is_none());
        assert!(!config.sites.is_empty());
        assert!(Orchestrator::new(config, Arc::new(PoliteClient::new().unwrap())).is_ok());
    }

    #[test]
    fn test_tandoor_default_url() {
        let config = parse(&["--tandoor-enabled", "true"]).into_config().unwrap();
        assert_eq!(
            config.tandoor.map(|t| t.base_url),
            Some("http://localhost:8080".to_string())
        );
    }

    #[test]
    fn test_http_flags_build_client() {
        let cli = parse(&["--per-host-delay-ms", "0", "--fetch-timeout-secs", "30"]);
        assert_eq!(cli.per_host_delay_ms, 0);
        assert_eq!(cli.fetch_timeout_secs, 30);
        assert!(cli.client_builder().build().is_ok());
    }

    #[test]
    fn test_site_override() {
        let config = parse(&[
            "--mealie-url",
            "http://mealie:9000/",
            "--sites",
            "https://a.com, https://b.com/sitemap.xml",
        ])
        .into_config()
        .unwrap();

        assert_eq!(config.sites.len(), 2);
        assert_eq!(config.sites[1].sitemap_url.as_deref(), Some("https://b.com/sitemap.xml"));
        assert_eq!(
            config.mealie.map(|m| m.base_url),
            Some("http://mealie:9000".to_string())
        );
    }

    #[test]
    fn test_enabled_backend_needs_url() {
        let err = parse(&["--tandoor-enabled", "true", "--tandoor-url", " "])
            .into_config()
            .unwrap_err();
        assert!(err.to_string().contains("Tandoor"));
    }

    #[test]
    fn test_mode_and_flags() {
        let config = parse(&[
            "--mealie-enabled",
            "false",
            "--dry-run",
            "no",
            "--mode",
            "audit",
            "--no-shuffle",
        ])
        .into_config()
        .unwrap();

        assert!(config.mealie.is_none());
        assert!(!config.dry_run);
        assert_eq!(config.mode, ScanMode::Audit);
        assert!(!config.shuffle);
    }
}
