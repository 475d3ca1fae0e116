//! Per-article wire service detection.
//!
//! [`detect`] runs four independent channels over an article's
//! [`ArticlePageSignals`] and unions what they find:
//!
//! | Channel | Input | Pattern tier |
//! |---------|-------|--------------|
//! | `byline-elements` | byline candidates | name |
//! | `meta-tags` | author meta values | meta |
//! | `content-patterns` | title + lead paragraphs | name, on extracted attributions |
//! | `url-patterns` | source URL | meta |
//!
//! Detection is a pure function of its input; it performs no I/O and cannot fail.

use crate::models::{ArticleDetectionResult, ArticlePageSignals, DetectionChannel};
use crate::registry::{PatternRegistry, WireServiceDefinition};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

/// Generic attribution forms found in article copy: "By NAME, SOURCE",
/// "(SOURCE) – ", and "SOURCE |".
static ATTRIBUTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"By\s+[^,]+,\s*([^.]+)", r"\([A-Z]+\)\s*[-–—]", r"([A-Z]+)\s*\|"]
        .iter()
        .map(|p| Regex::new(p).expect("valid attribution pattern"))
        .collect()
});

/// Detect wire service attribution on one article.
#[instrument(level = "debug", skip_all, fields(url = %signals.source_url))]
pub fn detect(signals: &ArticlePageSignals, registry: &PatternRegistry) -> ArticleDetectionResult {
    let mut result = ArticleDetectionResult::new(signals.source_url.clone());

    scan_first_match(
        &signals.byline_candidates,
        registry,
        WireServiceDefinition::matches_name,
        DetectionChannel::BylineElements,
        &mut result,
    );
    scan_first_match(
        &signals.meta_author_values,
        registry,
        WireServiceDefinition::matches_meta,
        DetectionChannel::MetaTags,
        &mut result,
    );
    scan_content(signals, registry, &mut result);
    scan_url(&signals.source_url, registry, &mut result);

    debug!(
        services = ?result.matched_services,
        channels = ?result.detection_channels,
        "Article scanned"
    );
    result
}

/// Each text is claimed by the first service (in registry order) that matches it.
fn scan_first_match(
    texts: &[String],
    registry: &PatternRegistry,
    matches: fn(&WireServiceDefinition, &str) -> bool,
    channel: DetectionChannel,
    result: &mut ArticleDetectionResult,
) {
    for text in texts {
        if let Some(service) = registry.entries().find(|s| matches(s, text)) {
            result.record(service.name, channel, Some(text.as_str()));
        }
    }
}

fn scan_content(
    signals: &ArticlePageSignals,
    registry: &PatternRegistry,
    result: &mut ArticleDetectionResult,
) {
    let content = std::iter::once(signals.title.as_str())
        .chain(signals.lead_paragraphs.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");

    for pattern in ATTRIBUTION_PATTERNS.iter() {
        for caps in pattern.captures_iter(&content) {
            let whole = caps.get(0).map_or("", |m| m.as_str()).trim();
            let candidate = caps.get(1).map_or(whole, |m| m.as_str().trim());

            for service in registry.entries() {
                if service.matches_name(candidate) {
                    result.record(service.name, DetectionChannel::ContentPatterns, Some(whole));
                }
            }
        }
    }
}

fn scan_url(url: &str, registry: &PatternRegistry, result: &mut ArticleDetectionResult) {
    for service in registry.entries() {
        if service.matches_meta(url) {
            result.record(service.name, DetectionChannel::UrlPatterns, None);
        }
    }
}
