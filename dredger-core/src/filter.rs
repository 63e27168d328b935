//! Cheap heuristics that reject obvious non-recipe pages.
//!
//! Everything here is pure: the URL checks run before any fetch, the title
//! check runs on a page that has already been fetched.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// "10-best-soups", "5-easy-ways-to-cook-rice", ...
static LISTICLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)-(best|top|must|favorite|easy|healthy|quick|ways|things)")
        .expect("Invalid listicle regex")
});

const BAD_KEYWORDS: &[&str] = &[
    "roundup",
    "collection",
    "guide",
    "review",
    "giveaway",
    "shop",
    "store",
    "product",
];

/// Path fragments of pages that are never recipes. Also used to prune
/// sitemap leaves.
const NON_CONTENT_MARKERS: &[&str] = &[
    "/about", "/contact", "/shop", "/privacy", "login", "cart", "roundup",
];

const LISTICLE_TITLES: &[&str] = &["best recipes", "top 10"];

/// Why a URL or page was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Listicle { slug: String },
    BadKeyword { keyword: &'static str },
    NonContentPath { marker: &'static str },
    ListicleTitle { title: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Listicle { slug } => write!(f, "Listicle detected in URL: {slug}"),
            SkipReason::BadKeyword { keyword } => write!(f, "Bad keyword in URL: {keyword}"),
            SkipReason::NonContentPath { marker } => write!(f, "Non-content path: {marker}"),
            SkipReason::ListicleTitle { title } => write!(f, "Listicle title detected: {title}"),
        }
    }
}

/// Lower-cased path of a URL. Unparseable input is treated as a bare path.
fn lower_path(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_lowercase(),
        Err(_) => url.to_lowercase(),
    }
}

/// Final non-empty path segment, lower-cased.
pub fn slug(url: &str) -> String {
    lower_path(url)
        .trim_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// The non-content marker present in the URL's path, if any.
pub fn non_content_marker(url: &str) -> Option<&'static str> {
    let path = lower_path(url);
    NON_CONTENT_MARKERS
        .iter()
        .copied()
        .find(|marker| path.contains(marker))
}

/// Pre-fetch check on the URL alone.
pub fn check_url(url: &str) -> Option<SkipReason> {
    let slug = slug(url);

    if LISTICLE_REGEX.is_match(&slug) {
        return Some(SkipReason::Listicle { slug });
    }

    if let Some(keyword) = BAD_KEYWORDS.iter().copied().find(|kw| slug.contains(kw)) {
        return Some(SkipReason::BadKeyword { keyword });
    }

    non_content_marker(url).map(|marker| SkipReason::NonContentPath { marker })
}

/// Content-level check on a fetched page's `<title>`.
pub fn check_title(title: &str) -> Option<SkipReason> {
    let lower = title.to_lowercase();
    LISTICLE_TITLES
        .iter()
        .any(|pattern| lower.contains(pattern))
        .then(|| SkipReason::ListicleTitle {
            title: title.trim().to_string(),
        })
}

/// URL check, then title check when a title is available.
pub fn classify(url: &str, title: Option<&str>) -> Option<SkipReason> {
    check_url(url).or_else(|| title.and_then(check_title))
}

/// Loose language gate.
///
/// Passes when the page's declared language (assumed `en` when absent)
/// contains the configured one, or whenever the configured language
/// mentions `en` at all.
pub fn language_allowed(configured: &str, declared: Option<&str>) -> bool {
    let declared = declared.unwrap_or("en");
    declared.contains(configured) || configured.contains("en")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_listicles() {
        assert!(matches!(
            check_url("https://example.com/10-best-soups"),
            Some(SkipReason::Listicle { .. })
        ));
        assert!(matches!(
            check_url("https://example.com/2023/01/5-easy-ways-to-cook-rice/"),
            Some(SkipReason::Listicle { .. })
        ));
        assert!(check_url("https://example.com/25-HEALTHY-Snacks").is_some());
    }

    #[test]
    fn test_rejects_shop_paths() {
        assert_eq!(
            check_url("https://example.com/shop/cookware"),
            Some(SkipReason::NonContentPath { marker: "/shop" })
        );
        assert_eq!(
            check_url("https://example.com/my-pan-review"),
            Some(SkipReason::BadKeyword { keyword: "review" })
        );
        assert!(check_url("https://example.com/about/").is_some());
    }

    #[test]
    fn test_accepts_recipes() {
        assert_eq!(check_url("https://example.com/creamy-garlic-chicken"), None);
        assert_eq!(check_url("https://example.com/recipes/creamy-garlic-chicken/"), None);
        assert_eq!(check_url("https://example.com/2024/05/lemon-bars"), None);
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("https://example.com/a/B-c/"), "b-c");
        assert_eq!(slug("https://example.com/"), "");
    }

    #[test]
    fn test_title_check() {
        assert!(check_title("The 25 Best Recipes for Fall").is_some());
        assert!(check_title("Top 10 Weeknight Dinners").is_some());
        assert_eq!(check_title("Creamy Garlic Chicken - Example Kitchen"), None);
    }

    #[test]
    fn test_classify_prefers_url_reason() {
        let reason = classify("https://example.com/10-best-soups", Some("Top 10 soups"));
        assert!(matches!(reason, Some(SkipReason::Listicle { .. })));
        assert!(classify("https://example.com/soup", Some("Top 10 soups")).is_some());
        assert_eq!(classify("https://example.com/soup", None), None);
    }

    #[test]
    fn test_skip_reason_is_readable() {
        let reason = check_url("https://example.com/10-best-soups").unwrap();
        assert_eq!(reason.to_string(), "Listicle detected in URL: 10-best-soups");
    }

    #[test]
    fn test_language_allowed() {
        assert!(language_allowed("en", None));
        assert!(language_allowed("en", Some("de-DE")));
        assert!(language_allowed("de", Some("de-DE")));
        assert!(!language_allowed("de", Some("fr-FR")));
        assert!(!language_allowed("de", None));
    }
}
