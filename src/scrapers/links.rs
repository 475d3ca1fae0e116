//! Candidate article link discovery on a site's front page.
//!
//! A link is kept when it stays on the site's own host and looks like an
//! article: a telltale path segment, a year in the path, an enclosing
//! `<article>` element, or a headline-length anchor text.

use crate::browser::RenderedPage;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, instrument};
use url::Url;

/// Path fragments that usually mark an article permalink.
const ARTICLE_PATH_HINTS: [&str; 4] = ["/article/", "/story/", "/news/", "/post/"];

/// Anchor texts longer than this are treated as headlines.
const MIN_HEADLINE_CHARS: usize = 20;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));
static YEAR_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d{4}/").expect("valid regex"));

/// Finds candidate article URLs on a rendered page.
pub trait LinkDiscovery {
    /// Ordered, deduplicated same-domain candidate article URLs.
    fn discover(&self, page: &RenderedPage, domain: &str) -> Vec<String>;
}

/// Path, placement, and anchor-text heuristics over the page's anchors.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicLinkDiscovery;

impl LinkDiscovery for HeuristicLinkDiscovery {
    #[instrument(level = "debug", skip(self, page), fields(url = %page.url))]
    fn discover(&self, page: &RenderedPage, domain: &str) -> Vec<String> {
        let document = Html::parse_document(&page.html);
        let Ok(site_root) = Url::parse(&format!("https://{domain}/")) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for anchor in document.select(&ANCHOR) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Some(resolved) = resolve_href(href.trim(), &site_root) else {
                continue;
            };
            if resolved.host_str() != Some(domain) {
                continue;
            }
            if !looks_like_article(&resolved, anchor) {
                continue;
            }

            let link = resolved.to_string();
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }

        debug!(count = links.len(), "Discovered candidate article links");
        links
    }
}

/// Absolute http(s) hrefs and root-relative paths; everything else is skipped.
fn resolve_href(href: &str, site_root: &Url) -> Option<Url> {
    if href.starts_with("http") {
        Url::parse(href).ok()
    } else if href.starts_with('/') {
        site_root.join(href).ok()
    } else {
        None
    }
}

fn looks_like_article(url: &Url, anchor: ElementRef<'_>) -> bool {
    let path = url.path().to_lowercase();
    ARTICLE_PATH_HINTS.iter().any(|hint| path.contains(hint))
        || YEAR_SEGMENT.is_match(&path)
        || inside_article(anchor)
        || anchor.text().collect::<String>().trim().chars().count() > MIN_HEADLINE_CHARS
}

fn inside_article(anchor: ElementRef<'_>) -> bool {
    anchor
        .ancestors()
        .filter_map(|node| node.value().as_element())
        .any(|el| el.name() == "article")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discover(html: &str) -> Vec<String> {
        let page = RenderedPage::new("https://example.com/", html);
        HeuristicLinkDiscovery.discover(&page, "example.com")
    }

    #[test]
    fn test_path_hints_are_kept() {
        let links = discover(
            r#"
            <a href="/news/city-budget">Budget</a>
            <a href="https://example.com/story/fire">Fire</a>
            <a href="/2025/05/06/storm">Storm</a>
            <a href="/about">About</a>
            "#,
        );
        assert_eq!(
            links,
            vec![
                "https://example.com/news/city-budget",
                "https://example.com/story/fire",
                "https://example.com/2025/05/06/storm",
            ]
        );
    }

    #[test]
    fn test_other_hosts_are_dropped() {
        let links = discover(
            r#"
            <a href="https://other.com/news/x">Elsewhere</a>
            <a href="https://sub.example.com/news/y">Subdomain</a>
            <a href="//cdn.example.net/news/z">Protocol relative</a>
            "#,
        );
        assert!(links.is_empty());
    }

    #[test]
    fn test_relative_and_special_hrefs_are_skipped() {
        let links = discover(
            r#"
            <a href="news/relative">Relative</a>
            <a href="mailto:tips@example.com">Tips</a>
            <a href="javascript:void(0)">Menu</a>
            "#,
        );
        assert!(links.is_empty());
    }

    #[test]
    fn test_article_container_and_headline_text() {
        let links = discover(
            r#"
            <article><a href="/sports/final">Final</a></article>
            <a href="/opinion/column">Council votes to expand the downtown bus network</a>
            <a href="/opinion/short">Short</a>
            "#,
        );
        assert_eq!(
            links,
            vec![
                "https://example.com/sports/final",
                "https://example.com/opinion/column",
            ]
        );
    }

    #[test]
    fn test_duplicates_keep_first_position() {
        let links = discover(
            r#"
            <a href="/news/a">A</a>
            <a href="/news/b">B</a>
            <a href="https://example.com/news/a">A again</a>
            "#,
        );
        assert_eq!(
            links,
            vec!["https://example.com/news/a", "https://example.com/news/b"]
        );
    }
}
