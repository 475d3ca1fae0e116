//! Data models for page signals, detection results, and reports.
//!
//! This module defines the records that flow through the pipeline:
//! - [`ArticlePageSignals`]: Attribution signals extracted from one rendered article
//! - [`ArticleDetectionResult`]: Which wire services one article is attributed to
//! - [`SiteAnalysisResult`]: The aggregated verdict for one site
//! - [`BatchResult`]: Every site result from a run plus a [`BatchSummary`]
//!
//! All records serialize with camelCase keys. Every record is built fresh per
//! run and is not mutated after it is returned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Attribution signals extracted from a single rendered article page.
///
/// Every field is always present; empty sequences mean the page had nothing
/// of that kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePageSignals {
    /// The URL the signals were extracted from.
    pub source_url: String,
    /// The document title.
    pub title: String,
    /// The leading part of the page's visible text.
    pub body_excerpt: String,
    /// Short texts from byline/author/writer/reporter regions.
    pub byline_candidates: Vec<String>,
    /// Values of author-related meta tags.
    pub meta_author_values: Vec<String>,
    /// The first few paragraphs, already filtered by minimum length.
    pub lead_paragraphs: Vec<String>,
}

/// The independent ways a wire service can be detected on an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionChannel {
    BylineElements,
    MetaTags,
    ContentPatterns,
    UrlPatterns,
}

impl DetectionChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionChannel::BylineElements => "byline-elements",
            DetectionChannel::MetaTags => "meta-tags",
            DetectionChannel::ContentPatterns => "content-patterns",
            DetectionChannel::UrlPatterns => "url-patterns",
        }
    }
}

impl fmt::Display for DetectionChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-article detection outcome.
///
/// The three collections behave as insertion-ordered sets: a service, snippet,
/// or channel appears at most once no matter how many times it matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetectionResult {
    pub source_url: String,
    pub matched_services: Vec<String>,
    pub evidence_snippets: Vec<String>,
    pub detection_channels: Vec<DetectionChannel>,
    pub error: Option<String>,
}

impl ArticleDetectionResult {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            ..Default::default()
        }
    }

    /// An error-tagged result: no services, no evidence, no channels.
    pub fn failed(source_url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Record one match. Each collection keeps only the first occurrence of a value.
    pub fn record(&mut self, service: &str, channel: DetectionChannel, evidence: Option<&str>) {
        if !self.matched_services.iter().any(|s| s == service) {
            self.matched_services.push(service.to_string());
        }
        if !self.detection_channels.contains(&channel) {
            self.detection_channels.push(channel);
        }
        if let Some(snippet) = evidence {
            if !self.evidence_snippets.iter().any(|s| s == snippet) {
                self.evidence_snippets.push(snippet.to_string());
            }
        }
    }

    pub fn has_service(&self, service: &str) -> bool {
        self.matched_services.iter().any(|s| s == service)
    }
}

/// One article cited as evidence for a consistent service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceArticle {
    pub url: String,
    /// Only the snippets that match this service's own patterns.
    pub evidence_snippets: Vec<String>,
    pub detection_channels: Vec<DetectionChannel>,
}

/// Site-level statistics for one consistently detected service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    /// Number of sampled articles attributed to the service.
    pub count: usize,
    /// `count` as a rounded percentage of the sample.
    pub percentage: u32,
    /// Up to three articles, in sample order.
    pub evidence_articles: Vec<EvidenceArticle>,
}

/// The verdict for a single site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteAnalysisResult {
    pub input_url: String,
    pub domain: String,
    pub articles_analyzed: usize,
    pub articles_with_wire_services: usize,
    pub article_results: Vec<ArticleDetectionResult>,
    pub per_service_stats: BTreeMap<String, ServiceStats>,
    pub consistent_services: Vec<String>,
    pub sample_bylines: Vec<String>,
    pub confidence_score: u32,
    /// Wall-clock time spent on the site, e.g. `"12.4s"`.
    pub processing_duration: String,
    pub error: Option<String>,
}

impl SiteAnalysisResult {
    /// An error-tagged result with zero articles analyzed and zero confidence.
    pub fn failed(
        input_url: impl Into<String>,
        domain: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            input_url: input_url.into(),
            domain: domain.into(),
            processing_duration: "0.0s".to_string(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn uses_wire_services(&self) -> bool {
        !self.consistent_services.is_empty()
    }
}

/// Totals across every site in a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total_sites: usize,
    pub sites_with_wire_services: usize,
    pub total_articles_analyzed: usize,
    pub average_confidence: u32,
}

impl BatchSummary {
    pub fn from_results(results: &[SiteAnalysisResult]) -> Self {
        let total_sites = results.len();
        let confidence_sum: u32 = results.iter().map(|r| r.confidence_score).sum();
        let average_confidence = if total_sites == 0 {
            0
        } else {
            // Rounded half up, integer only.
            let n = total_sites as u32;
            (confidence_sum * 2 + n) / (2 * n)
        };

        Self {
            total_sites,
            sites_with_wire_services: results.iter().filter(|r| r.uses_wire_services()).count(),
            total_articles_analyzed: results.iter().map(|r| r.articles_analyzed).sum(),
            average_confidence,
        }
    }
}

/// Everything produced by one batch run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub generated_at: DateTime<Utc>,
    pub results: Vec<SiteAnalysisResult>,
    pub summary: BatchSummary,
}

impl BatchResult {
    pub fn new(results: Vec<SiteAnalysisResult>) -> Self {
        let summary = BatchSummary::from_results(&results);
        Self {
            generated_at: Utc::now(),
            results,
            summary,
        }
    }
}

/// Events written by `--ndjson`, one JSON object per line.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent<'a> {
    Progress { message: &'a str },
    Complete {
        results: &'a [SiteAnalysisResult],
        summary: &'a BatchSummary,
    },
}
