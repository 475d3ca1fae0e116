//! Site-level aggregation of per-article detection results.
//!
//! A service is reported for a site only when it shows up on enough of the
//! sampled articles to look systematic rather than incidental:
//!
//! ```text
//! threshold  = max(2, floor(sampled * 0.15))
//! percentage = round(count / sampled * 100)
//! confidence = min(60, max percentage)
//!            + 20 if more than one detection channel fired anywhere on the site
//!            + 10 if more than one service is consistent
//!            + 10 if sampled >= minimum sample size
//! ```
//!
//! Services are counted once per article, while channel diversity accumulates
//! over the whole site.

use crate::models::{
    ArticleDetectionResult, DetectionChannel, EvidenceArticle, ServiceStats,
};
use crate::registry::PatternRegistry;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

/// Sample size at which the confidence score earns its sample bonus.
pub const DEFAULT_MINIMUM_SAMPLE_SIZE: usize = 8;

const MAX_EVIDENCE_ARTICLES: usize = 3;
const MAX_SAMPLE_BYLINES: usize = 5;

/// The aggregated part of a site verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteAggregate {
    pub total_sampled: usize,
    pub articles_with_wire_services: usize,
    pub per_service_stats: BTreeMap<String, ServiceStats>,
    /// Consistent services in registry order.
    pub consistent_services: Vec<String>,
    pub sample_bylines: Vec<String>,
    pub confidence_score: u32,
}

/// Minimum number of articles a service must appear on to count as consistent.
pub fn consistency_threshold(total_sampled: usize) -> usize {
    (total_sampled * 15 / 100).max(2)
}

/// Combine a site's per-article results into a verdict.
#[instrument(level = "debug", skip_all, fields(sampled = results.len()))]
pub fn aggregate(
    results: &[ArticleDetectionResult],
    registry: &PatternRegistry,
    minimum_sample_size: usize,
) -> SiteAggregate {
    let total_sampled = results.len();
    let threshold = consistency_threshold(total_sampled);

    let mut per_service_stats = BTreeMap::new();
    let mut consistent_services = Vec::new();

    for service in registry.entries() {
        let count = results.iter().filter(|r| r.has_service(service.name)).count();
        debug!(service = service.name, count, threshold, "Service tally");
        if count < threshold {
            continue;
        }

        let evidence_articles = results
            .iter()
            .filter(|r| r.has_service(service.name))
            .take(MAX_EVIDENCE_ARTICLES)
            .map(|r| EvidenceArticle {
                url: r.source_url.clone(),
                evidence_snippets: r
                    .evidence_snippets
                    .iter()
                    .filter(|s| service.owns_snippet(s))
                    .cloned()
                    .collect(),
                detection_channels: r.detection_channels.clone(),
            })
            .collect();

        per_service_stats.insert(
            service.name.to_string(),
            ServiceStats {
                count,
                percentage: percentage(count, total_sampled),
                evidence_articles,
            },
        );
        consistent_services.push(service.name.to_string());
    }

    let sample_bylines = results
        .iter()
        .flat_map(|r| r.evidence_snippets.iter())
        .unique()
        .take(MAX_SAMPLE_BYLINES)
        .cloned()
        .collect();

    let channels: BTreeSet<DetectionChannel> = results
        .iter()
        .flat_map(|r| r.detection_channels.iter().copied())
        .collect();

    let max_percentage = per_service_stats.values().map(|s| s.percentage).max();
    let confidence_score = confidence_score(
        max_percentage,
        channels.len(),
        consistent_services.len(),
        total_sampled,
        minimum_sample_size,
    );

    SiteAggregate {
        total_sampled,
        articles_with_wire_services: results
            .iter()
            .filter(|r| !r.matched_services.is_empty())
            .count(),
        per_service_stats,
        consistent_services,
        sample_bylines,
        confidence_score,
    }
}

/// `round(count / total * 100)`, rounding halves up.
fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count * 200 + total) / (2 * total)) as u32
}

/// Heuristic 0-100 score. Zero exactly when nothing is consistent.
pub fn confidence_score(
    max_percentage: Option<u32>,
    channel_count: usize,
    consistent_count: usize,
    total_sampled: usize,
    minimum_sample_size: usize,
) -> u32 {
    let Some(max_percentage) = max_percentage else {
        return 0;
    };
    if consistent_count == 0 {
        return 0;
    }

    let mut score = max_percentage.min(60);
    if channel_count > 1 {
        score += 20;
    }
    if consistent_count > 1 {
        score += 10;
    }
    if total_sampled >= minimum_sample_size {
        score += 10;
    }
    score.min(100)
}
