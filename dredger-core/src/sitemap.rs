//! Sitemap discovery and expansion.
//!
//! A site's sitemap is found by probing the usual WordPress/Yoast paths,
//! then expanded into a flat, de-duplicated and capped list of page URLs.
//! Any failure below the top level only empties that branch.

use std::collections::HashSet;
use std::io::Read;

use flate2::read::GzDecoder;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::error::FetchError;
use crate::filter;
use crate::http::HttpClient;
use crate::types::Site;

/// Probed in order; the first path answering 2xx wins.
pub const SITEMAP_PATHS: &[&str] = &[
    "/post-sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap.xml",
    "/sitemap_posts.xml",
];

/// Nested indices deeper than this are ignored.
const MAX_INDEX_NESTING: usize = 3;

/// Child sitemaps whose location contains this are followed.
const POST_HINT: &str = "post";

#[derive(Debug, Deserialize)]
struct SitemapIndex {
    sitemap: Vec<SitemapEntry>,
}

#[derive(Debug, Deserialize)]
struct SitemapEntry {
    loc: String,
}

#[derive(Debug, Deserialize)]
struct Urlset {
    url: Vec<UrlEntry>,
}

#[derive(Debug, Deserialize)]
struct UrlEntry {
    loc: String,
}

/// A parsed sitemap document.
#[derive(Debug, PartialEq, Eq)]
pub enum SitemapDoc {
    Index(Vec<String>),
    Leaf(Vec<String>),
}

/// What to do with an index none of whose post-like children produced
/// anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexFallback {
    /// Descend into the first child regardless of its name. Catches
    /// indices whose children are not named after posts.
    #[default]
    FirstChild,
    Disabled,
}

/// Parse sitemap XML. Returns `None` for documents that are neither an
/// index nor a urlset, and for empty ones.
pub fn parse_sitemap(xml: &str) -> Option<SitemapDoc> {
    if let Ok(index) = from_str::<SitemapIndex>(xml) {
        if !index.sitemap.is_empty() {
            return Some(SitemapDoc::Index(
                index.sitemap.into_iter().map(|s| s.loc.trim().to_string()).collect(),
            ));
        }
    }

    from_str::<Urlset>(xml).ok().map(|urlset| {
        SitemapDoc::Leaf(urlset.url.into_iter().map(|u| u.loc.trim().to_string()).collect())
    })
}

/// Resolve `loc` against the document it came from; drop non-http(s) values.
fn absolutize(base: &str, loc: &str) -> Option<String> {
    let resolved = match url::Url::parse(loc) {
        Ok(u) => u,
        Err(url::ParseError::RelativeUrlWithoutBase) => url::Url::parse(base).ok()?.join(loc).ok()?,
        Err(_) => return None,
    };
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

fn decode_sitemap(url: &str, bytes: Vec<u8>) -> Result<String, FetchError> {
    let gzipped = url.ends_with(".gz") || bytes.starts_with(&[0x1f, 0x8b]);
    if gzipped {
        let mut content = String::new();
        GzDecoder::new(&bytes[..])
            .read_to_string(&mut content)
            .map_err(|e| FetchError::InvalidBody(format!("gzip: {e}")))?;
        return Ok(content);
    }
    String::from_utf8(bytes).map_err(|e| FetchError::InvalidBody(e.to_string()))
}

/// Candidate URLs gathered so far, in discovery order, without repeats.
struct Collected {
    urls: Vec<String>,
    seen: HashSet<String>,
    cap: usize,
}

impl Collected {
    fn new(cap: usize) -> Self {
        Self {
            urls: Vec::new(),
            seen: HashSet::new(),
            cap,
        }
    }

    fn full(&self) -> bool {
        self.urls.len() >= self.cap
    }

    fn push(&mut self, url: String) {
        if !self.full() && self.seen.insert(url.clone()) {
            self.urls.push(url);
        }
    }
}

pub struct SitemapResolver<'a> {
    client: &'a dyn HttpClient,
    scan_depth: usize,
    fallback: IndexFallback,
}

impl<'a> SitemapResolver<'a> {
    pub fn new(client: &'a dyn HttpClient, scan_depth: usize) -> Self {
        Self {
            client,
            scan_depth,
            fallback: IndexFallback::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: IndexFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Locate the site's sitemap: the configured one, the first conventional
    /// path that probes 2xx, or the first `Sitemap:` line of robots.txt.
    pub async fn find_sitemap(&self, site: &Site) -> Option<String> {
        if let Some(known) = &site.sitemap_url {
            return Some(known.clone());
        }

        for path in SITEMAP_PATHS {
            let candidate = format!("{}{}", site.base_url, path);
            match self.client.probe(&candidate).await {
                Ok(status) if (200..300).contains(&status) => {
                    tracing::debug!(url = %candidate, status, "sitemap found");
                    return Some(candidate);
                }
                Ok(status) => tracing::debug!(url = %candidate, status, "sitemap probe missed"),
                Err(e) => tracing::debug!(url = %candidate, error = %e, "sitemap probe failed"),
            }
        }

        self.sitemap_from_robots(site).await
    }

    async fn sitemap_from_robots(&self, site: &Site) -> Option<String> {
        let robots_url = format!("{}/robots.txt", site.base_url);
        let content = self.client.fetch_html(&robots_url).await.ok()?;

        content.lines().find_map(|line| {
            let line = line.trim();
            let (key, value) = line.split_once(':')?;
            (key.trim().eq_ignore_ascii_case("sitemap"))
                .then(|| value.trim().to_string())
                .filter(|v| !v.is_empty())
        })
    }

    /// Expand a site's sitemap into at most `scan_depth` unique page URLs.
    /// An unreachable or unparseable sitemap yields an empty list.
    pub async fn resolve(&self, site: &Site) -> (Option<String>, Vec<String>) {
        let Some(sitemap_url) = self.find_sitemap(site).await else {
            return (None, Vec::new());
        };
        let urls = self.expand(&sitemap_url).await;
        (Some(sitemap_url), urls)
    }

    /// Expand one sitemap URL (index or leaf).
    pub async fn expand(&self, sitemap_url: &str) -> Vec<String> {
        let mut collected = Collected::new(self.scan_depth);
        let mut visited = HashSet::new();
        self.descend(sitemap_url, 0, &mut collected, &mut visited).await;
        collected.urls
    }

    async fn load(&self, url: &str) -> Option<SitemapDoc> {
        let bytes = match self.client.fetch_bytes(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(url, error = %e, "sitemap fetch failed");
                return None;
            }
        };

        let xml = match decode_sitemap(url, bytes) {
            Ok(xml) => xml,
            Err(e) => {
                tracing::debug!(url, error = %e, "sitemap decode failed");
                return None;
            }
        };

        let doc = parse_sitemap(&xml);
        if doc.is_none() {
            tracing::debug!(url, "sitemap parse failed");
        }
        doc
    }

    async fn descend(
        &self,
        url: &str,
        nesting: usize,
        collected: &mut Collected,
        visited: &mut HashSet<String>,
    ) {
        if collected.full() || !visited.insert(url.to_string()) {
            return;
        }

        tracing::info!(url, "parsing sitemap");
        match self.load(url).await {
            Some(SitemapDoc::Index(children)) => {
                if nesting >= MAX_INDEX_NESTING {
                    tracing::debug!(url, "sitemap index nested too deep");
                    return;
                }
                let children: Vec<String> = children
                    .iter()
                    .filter_map(|loc| absolutize(url, loc))
                    .collect();
                let before = collected.urls.len();

                for child in children.iter().filter(|c| c.to_lowercase().contains(POST_HINT)) {
                    if collected.full() {
                        break;
                    }
                    Box::pin(self.descend(child, nesting + 1, collected, visited)).await;
                }

                if collected.urls.len() == before && self.fallback == IndexFallback::FirstChild {
                    if let Some(first) = children.first() {
                        tracing::debug!(url, child = %first, "no post sitemaps produced URLs, trying first child");
                        Box::pin(self.descend(first, nesting + 1, collected, visited)).await;
                    }
                }
            }
            Some(SitemapDoc::Leaf(locs)) => {
                for loc in locs {
                    if collected.full() {
                        break;
                    }
                    let Some(page) = absolutize(url, &loc) else {
                        continue;
                    };
                    if filter::non_content_marker(&page).is_some() {
                        continue;
                    }
                    collected.push(page);
                }
            }
            None => {}
        }
    }
}
