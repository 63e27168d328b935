//! Recipe detection on fetched pages.
//!
//! Two strengths of evidence are supported:
//! - [`scan_page`] looks for a schema.org Recipe object in the page's
//!   JSON-LD blocks and returns it as a [`RecipeRecord`].
//! - [`has_recipe_marker`] accepts a page on a raw `"@type": "Recipe"`
//!   marker anywhere in the text, or on the markup of a known recipe plugin.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value as JsonValue;

use crate::error::{BlockError, FetchError};
use crate::filter::{self, SkipReason};
use crate::http::HttpClient;
use crate::types::RecipeRecord;

static JSONLD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("Invalid JSON-LD selector")
});

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("Invalid title selector"));

/// Class-name fragments of WP Recipe Maker, Tasty Recipes and Mediavine Create cards.
static PLUGIN_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#"[class*="wp-recipe-maker"], [class*="tasty-recipes"], [class*="mv-create-card"]"#,
    )
    .expect("Invalid plugin selector")
});

static RECIPE_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""@type"\s*:\s*\[?\s*"Recipe""#).expect("Invalid recipe marker regex")
});

/// What a single page turned out to be.
#[derive(Debug)]
pub enum PageOutcome {
    Recipe(RecipeRecord),
    /// Recipe evidence without a structured record (marker check only).
    RecipeMarker,
    Skipped(SkipReason),
    NotRecipe,
    /// The page could not be reached at all. Not a verdict on the URL.
    Unreachable(FetchError),
}

/// How much evidence a page needs to count as a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evidence {
    StructuredData,
    Marker,
}

/// Result of scanning one page's HTML.
#[derive(Debug, Default)]
pub struct PageScan {
    pub title: Option<String>,
    pub recipe: Option<RecipeRecord>,
    /// Blocks that were looked at and did not produce the recipe.
    pub block_errors: Vec<BlockError>,
}

/// Scan HTML for its title and the first JSON-LD Recipe in document order.
pub fn scan_page(html: &str) -> PageScan {
    let document = Html::parse_document(html);
    let mut scan = PageScan {
        title: page_title(&document),
        ..Default::default()
    };

    for (index, element) in document.select(&JSONLD_SELECTOR).enumerate() {
        let text: String = element.text().collect();
        match recipe_from_block(index, &text) {
            Ok(record) => {
                scan.recipe = Some(record);
                break;
            }
            Err(e) => scan.block_errors.push(e),
        }
    }

    scan
}

fn page_title(document: &Html) -> Option<String> {
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Parse one JSON-LD block and pull the Recipe out of it.
pub fn recipe_from_block(index: usize, text: &str) -> Result<RecipeRecord, BlockError> {
    let json: JsonValue =
        serde_json::from_str(&sanitize_json(text)).map_err(|e| BlockError::InvalidJson {
            index,
            message: e.to_string(),
        })?;

    find_recipe(&json)
        .and_then(|v| v.as_object())
        .map(|obj| RecipeRecord::new(obj.clone()))
        .ok_or(BlockError::NotRecipe { index })
}

/// Accepts a bare Recipe object, an array of objects, or an object with
/// an `@graph` array. The first Recipe wins.
fn find_recipe(json: &JsonValue) -> Option<&JsonValue> {
    match json {
        JsonValue::Array(items) => items.iter().find(|item| is_recipe(item)),
        JsonValue::Object(obj) => {
            if is_recipe(json) {
                return Some(json);
            }
            obj.get("@graph")
                .and_then(|graph| graph.as_array())
                .and_then(|items| items.iter().find(|item| is_recipe(item)))
        }
        _ => None,
    }
}

fn is_recipe(json: &JsonValue) -> bool {
    let is_recipe_name = |s: &str| s == "Recipe" || s == "recipe";
    match json.get("@type") {
        Some(JsonValue::String(s)) => is_recipe_name(s),
        Some(JsonValue::Array(types)) => types.iter().filter_map(|t| t.as_str()).any(is_recipe_name),
        _ => false,
    }
}

/// Escape literal newlines and tabs inside JSON strings; some blogs emit
/// them unescaped. Other control characters inside strings are dropped.
fn sanitize_json(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in json.chars() {
        if in_string {
            if escaped {
                escaped = false;
                result.push(c);
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    result.push(c);
                }
                '"' => {
                    in_string = false;
                    result.push(c);
                }
                '\n' => result.push_str("\\n"),
                '\r' => result.push_str("\\r"),
                '\t' => result.push_str("\\t"),
                c if c.is_control() => {}
                _ => result.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            result.push(c);
        }
    }

    result
}

/// Weak recipe evidence: a Recipe type marker in the raw text (wherever it
/// is rendered), or a known recipe plugin's card markup.
pub fn has_recipe_marker(html: &str) -> bool {
    if RECIPE_MARKER_REGEX.is_match(html) {
        return true;
    }
    Html::parse_document(html)
        .select(&PLUGIN_SELECTOR)
        .next()
        .is_some()
}

/// Fetches pages and decides whether they hold a recipe.
pub struct RecipeExtractor<'a> {
    client: &'a dyn HttpClient,
    evidence: Evidence,
}

impl<'a> RecipeExtractor<'a> {
    pub fn new(client: &'a dyn HttpClient, evidence: Evidence) -> Self {
        Self { client, evidence }
    }

    pub async fn check(&self, url: &str) -> PageOutcome {
        let html = match self.client.fetch_html(url).await {
            Ok(html) => html,
            Err(e) if e.is_transport() => {
                tracing::warn!(url, error = %e, "page unreachable");
                return PageOutcome::Unreachable(e);
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "page fetch failed");
                return PageOutcome::NotRecipe;
            }
        };

        match self.evidence {
            Evidence::StructuredData => self.check_structured(url, &html),
            Evidence::Marker => self.check_marker(url, &html),
        }
    }

    fn check_structured(&self, url: &str, html: &str) -> PageOutcome {
        let scan = scan_page(html);

        if let Some(reason) = scan.title.as_deref().and_then(filter::check_title) {
            tracing::warn!(url, %reason, "paranoid skip");
            return PageOutcome::Skipped(reason);
        }

        for error in &scan.block_errors {
            tracing::debug!(url, %error, "JSON-LD block skipped");
        }

        match scan.recipe {
            Some(record) => {
                tracing::debug!(url, name = record.name().unwrap_or_default(), "found JSON-LD recipe");
                PageOutcome::Recipe(record)
            }
            None => PageOutcome::NotRecipe,
        }
    }

    fn check_marker(&self, url: &str, html: &str) -> PageOutcome {
        let title = page_title(&Html::parse_document(html));
        if let Some(reason) = title.as_deref().and_then(filter::check_title) {
            tracing::warn!(url, %reason, "paranoid skip");
            return PageOutcome::Skipped(reason);
        }

        if has_recipe_marker(html) {
            PageOutcome::RecipeMarker
        } else {
            PageOutcome::NotRecipe
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockClient;

    fn page(blocks: &[&str]) -> String {
        let scripts: String = blocks
            .iter()
            .map(|b| format!(r#"<script type="application/ld+json">{b}</script>"#))
            .collect();
        format!("<html><head><title>Dinner</title>{scripts}</head><body></body></html>")
    }

    #[test]
    fn test_single_recipe_object() {
        let html = page(&[r#"{"@type":"Recipe","name":"X"}"#]);
        let scan = scan_page(&html);
        assert_eq!(scan.recipe.unwrap().name(), Some("X"));
        assert_eq!(scan.title.as_deref(), Some("Dinner"));
    }

    #[test]
    fn test_list_picks_recipe_over_article() {
        let html = page(&[r#"[{"@type":"Article"}, {"@type":"Recipe","name":"Y"}]"#]);
        assert_eq!(scan_page(&html).recipe.unwrap().name(), Some("Y"));
    }

    #[test]
    fn test_graph_recipe_found_anywhere() {
        let html = page(&[r#"{"@context":"https://schema.org","@graph":[
            {"@type":"WebSite","name":"Blog"},
            {"@type":"BreadcrumbList"},
            {"@type":["Recipe"],"name":"Z"},
            {"@type":"Person","name":"Author"}
        ]}"#]);
        assert_eq!(scan_page(&html).recipe.unwrap().name(), Some("Z"));
    }

    #[test]
    fn test_malformed_block_does_not_stop_scan() {
        let html = page(&[
            r#"{"@type": "Recipe", "name": "#,
            r#"{"@type":"Organization"}"#,
            r#"{"@type":"recipe","name":"Later"}"#,
        ]);
        let scan = scan_page(&html);
        assert_eq!(scan.recipe.unwrap().name(), Some("Later"));
        assert_eq!(scan.block_errors.len(), 2);
        assert!(matches!(scan.block_errors[0], BlockError::InvalidJson { index: 0, .. }));
        assert_eq!(scan.block_errors[1], BlockError::NotRecipe { index: 1 });
    }

    #[test]
    fn test_first_recipe_in_document_order() {
        let html = page(&[
            r#"{"@type":"Recipe","name":"First"}"#,
            r#"{"@type":"Recipe","name":"Second"}"#,
        ]);
        assert_eq!(scan_page(&html).recipe.unwrap().name(), Some("First"));
    }

    #[test]
    fn test_literal_newlines_in_strings() {
        let html = page(&["{\"@type\":\"Recipe\",\"name\":\"Two\nLines\"}"]);
        assert_eq!(scan_page(&html).recipe.unwrap().name(), Some("Two\nLines"));
    }

    #[test]
    fn test_no_recipe() {
        let html = page(&[r#"{"@type":"Article","headline":"Recipe roundup"}"#]);
        let scan = scan_page(&html);
        assert!(scan.recipe.is_none());
        assert_eq!(scan.block_errors, vec![BlockError::NotRecipe { index: 0 }]);
    }

    #[test]
    fn test_recipe_marker_variants() {
        assert!(has_recipe_marker(r#"<div data-x='{"@type": "Recipe"}'></div>"#));
        assert!(has_recipe_marker(
            r#"<div class="wprm-recipe wp-recipe-maker-card">...</div>"#
        ));
        assert!(has_recipe_marker(r#"<div class="tasty-recipes-entry"></div>"#));
        assert!(has_recipe_marker(r#"<section class="mv-create-card mv-recipe"></section>"#));
        assert!(!has_recipe_marker(r#"<div class="entry-content">Just a story</div>"#));
    }

    #[tokio::test]
    async fn test_check_structured() {
        let client = MockClient::new().with_html(
            "https://blog.test/soup",
            &page(&[r#"{"@type":"Recipe","name":"Soup"}"#]),
        );
        let extractor = RecipeExtractor::new(&client, Evidence::StructuredData);
        match extractor.check("https://blog.test/soup").await {
            PageOutcome::Recipe(record) => assert_eq!(record.name(), Some("Soup")),
            other => panic!("expected recipe, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_check_listicle_title_is_skip() {
        let html = r#"<html><head><title>Top 10 Soups</title>
            <script type="application/ld+json">{"@type":"Recipe","name":"Soup"}</script>
            </head></html>"#;
        let client = MockClient::new().with_html("https://blog.test/soups", html);
        let extractor = RecipeExtractor::new(&client, Evidence::StructuredData);
        assert!(matches!(
            extractor.check("https://blog.test/soups").await,
            PageOutcome::Skipped(SkipReason::ListicleTitle { .. })
        ));
    }

    #[tokio::test]
    async fn test_check_status_vs_transport() {
        let client = MockClient::new()
            .with_status("https://blog.test/gone", 410)
            .with_error("https://blog.test/slow", "timed out");
        let extractor = RecipeExtractor::new(&client, Evidence::StructuredData);

        assert!(matches!(
            extractor.check("https://blog.test/gone").await,
            PageOutcome::NotRecipe
        ));
        assert!(matches!(
            extractor.check("https://blog.test/slow").await,
            PageOutcome::Unreachable(_)
        ));
    }

    #[tokio::test]
    async fn test_check_marker_mode() {
        let client = MockClient::new()
            .with_html(
                "https://blog.test/card",
                r#"<html><body><div class="tasty-recipes">Card</div></body></html>"#,
            )
            .with_html("https://blog.test/story", "<html><body>Story</body></html>");
        let extractor = RecipeExtractor::new(&client, Evidence::Marker);

        assert!(matches!(
            extractor.check("https://blog.test/card").await,
            PageOutcome::RecipeMarker
        ));
        assert!(matches!(
            extractor.check("https://blog.test/story").await,
            PageOutcome::NotRecipe
        ));
    }
}
