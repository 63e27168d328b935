pub mod config;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod filter;
pub mod http;
pub mod import;
pub mod orchestrator;
pub mod sitemap;
pub mod sites;
pub mod types;

pub use config::{BackendConfig, DredgerConfig};
pub use dedup::DedupStore;
pub use error::{BlockError, ConfigError, FetchError, ImportError};
pub use extract::{Evidence, PageOutcome, RecipeExtractor};
pub use filter::SkipReason;
pub use http::{HttpClient, MockClient, PoliteClient};
pub use import::{Dispatcher, Importer, MealieImporter, TandoorImporter};
pub use orchestrator::Orchestrator;
pub use sitemap::{IndexFallback, SitemapResolver};
pub use types::{ImportOutcome, RecipeRecord, RunReport, ScanMode, Site, SiteReport};
