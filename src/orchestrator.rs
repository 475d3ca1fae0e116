//! Sequential batch analysis across sites and their sampled articles.
//!
//! Each site moves through discovery, sampling, and aggregation:
//!
//! ```text
//! DISCOVER ──(no links)──────────────────────────▶ error: no articles
//!    │
//!    └──(links)──▶ SAMPLE 1..k ──▶ AGGREGATE ──▶ DONE      k = min(links, max_articles)
//! ```
//!
//! Sites and articles are processed strictly one at a time, in input order.
//! An article failure becomes an error-tagged article result and sampling
//! continues; a site failure becomes an error-tagged site result and the batch
//! continues. Politeness toward target sites comes only from the fixed delays
//! in [`PacingPolicy`] and the sample cap in [`SampleBounds`].

use crate::aggregator::aggregate;
use crate::browser::{BrowserHandle, PageRenderer};
use crate::detector::detect;
use crate::errors::{ArticleError, SiteError};
use crate::models::{ArticleDetectionResult, ArticlePageSignals, BatchResult, SiteAnalysisResult};
use crate::registry::PatternRegistry;
use crate::scrapers::{LinkDiscovery, extract_signals};
use crate::utils::{format_elapsed, truncate_for_log, truncate_path};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Characters of an article path shown in progress messages.
const PROGRESS_PATH_CHARS: usize = 30;

/// How many articles to sample per site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SampleBounds {
    /// Sample size needed for the confidence sample bonus.
    pub min_articles: usize,
    /// Hard cap on articles fetched per site.
    pub max_articles: usize,
}

impl Default for SampleBounds {
    fn default() -> Self {
        Self {
            min_articles: 8,
            max_articles: 15,
        }
    }
}

/// Fixed delays between consecutive requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    pub article_delay: Duration,
    pub site_delay: Duration,
}

impl PacingPolicy {
    /// No delays at all.
    pub fn none() -> Self {
        Self {
            article_delay: Duration::ZERO,
            site_delay: Duration::ZERO,
        }
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            article_delay: Duration::from_secs(1),
            site_delay: Duration::from_secs(2),
        }
    }
}

/// Navigation timeouts handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationTimeouts {
    /// Site front pages, which are usually heavier.
    pub discovery: Duration,
    pub article: Duration,
}

impl Default for NavigationTimeouts {
    fn default() -> Self {
        Self {
            discovery: Duration::from_secs(20),
            article: Duration::from_secs(15),
        }
    }
}

/// Receives human-readable status lines as the batch progresses.
pub trait ProgressSink {
    fn emit(&mut self, message: &str);
}

impl<F: FnMut(&str)> ProgressSink for F {
    fn emit(&mut self, message: &str) {
        self(message)
    }
}

/// Drives discovery, sampling, detection, and aggregation for a batch of sites.
pub struct BatchOrchestrator<R, D> {
    browser: BrowserHandle,
    renderer: R,
    discovery: D,
    registry: &'static PatternRegistry,
    pacing: PacingPolicy,
    timeouts: NavigationTimeouts,
}

impl<R, D> BatchOrchestrator<R, D>
where
    R: PageRenderer,
    D: LinkDiscovery,
{
    pub fn new(browser: BrowserHandle, renderer: R, discovery: D) -> Self {
        Self {
            browser,
            renderer,
            discovery,
            registry: PatternRegistry::global(),
            pacing: PacingPolicy::default(),
            timeouts: NavigationTimeouts::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_timeouts(mut self, timeouts: NavigationTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn browser(&self) -> &BrowserHandle {
        &self.browser
    }

    /// Close the rendering resource. Call once the batch is finished.
    pub fn shutdown(&self) {
        self.browser.close();
    }

    /// Analyze every non-blank site URL in order.
    #[instrument(level = "info", skip_all, fields(sites = site_urls.len()))]
    pub async fn run<P: ProgressSink>(
        &self,
        site_urls: &[String],
        bounds: SampleBounds,
        progress: &mut P,
    ) -> BatchResult {
        let total = site_urls.len();
        progress.emit(&format!("🛰️ Starting wire service analysis of {total} site(s)..."));

        let mut results: Vec<SiteAnalysisResult> = Vec::new();
        for (i, raw) in site_urls.iter().enumerate() {
            let url = raw.trim();
            if url.is_empty() {
                debug!(index = i, "Skipping blank site entry");
                continue;
            }
            if !results.is_empty() {
                pause(self.pacing.site_delay).await;
            }

            let label = Url::parse(url)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_else(|| url.to_string());
            progress.emit(&format!("🌐 Processing site {}/{}: {}", i + 1, total, label));

            results.push(self.analyze_site(url, bounds, progress).await);
        }

        let batch = BatchResult::new(results);
        info!(
            total_sites = batch.summary.total_sites,
            sites_with_wire_services = batch.summary.sites_with_wire_services,
            total_articles = batch.summary.total_articles_analyzed,
            average_confidence = batch.summary.average_confidence,
            "Batch complete"
        );
        batch
    }

    /// Discover, sample, and aggregate one site. Never fails; failures are
    /// reported in the result's `error` field.
    #[instrument(level = "info", skip(self, bounds, progress))]
    pub async fn analyze_site<P: ProgressSink>(
        &self,
        input_url: &str,
        bounds: SampleBounds,
        progress: &mut P,
    ) -> SiteAnalysisResult {
        let started = Instant::now();

        let domain = match site_domain(input_url) {
            Ok(domain) => domain,
            Err(e) => return site_failure(input_url, "", e, started),
        };
        progress.emit(&format!("🚀 Starting analysis of {domain}..."));

        progress.emit(&format!("🔍 Discovering articles on {domain}..."));
        let links = match self.discover_links(input_url, &domain).await {
            Ok(links) if links.is_empty() => {
                return site_failure(input_url, &domain, SiteError::NoArticlesFound, started);
            }
            Ok(links) => links,
            Err(e) => {
                progress.emit(&format!("⚠️ {e}"));
                return site_failure(input_url, &domain, e, started);
            }
        };

        let sample_size = links.len().min(bounds.max_articles);
        progress.emit(&format!(
            "📊 Found {} articles, analyzing {}...",
            links.len(),
            sample_size
        ));

        let mut article_results = Vec::with_capacity(sample_size);
        for (i, article_url) in links.iter().take(sample_size).enumerate() {
            if i > 0 {
                pause(self.pacing.article_delay).await;
            }
            progress.emit(&format!(
                "📄 Analyzing article {}/{}: {}...",
                i + 1,
                sample_size,
                truncate_path(article_url, PROGRESS_PATH_CHARS)
            ));
            article_results.push(self.analyze_article(article_url).await);
        }

        let verdict = aggregate(&article_results, self.registry, bounds.min_articles);
        let elapsed = started.elapsed();
        info!(
            %domain,
            articles = article_results.len(),
            services = ?verdict.consistent_services,
            confidence = verdict.confidence_score,
            elapsed_ms = elapsed.as_millis() as u64,
            "Site analyzed"
        );

        SiteAnalysisResult {
            input_url: input_url.to_string(),
            domain,
            articles_analyzed: article_results.len(),
            articles_with_wire_services: verdict.articles_with_wire_services,
            article_results,
            per_service_stats: verdict.per_service_stats,
            consistent_services: verdict.consistent_services,
            sample_bylines: verdict.sample_bylines,
            confidence_score: verdict.confidence_score,
            processing_duration: format_elapsed(elapsed),
            error: None,
        }
    }

    /// Render one article and detect attribution on it. Never fails.
    pub async fn analyze_article(&self, url: &str) -> ArticleDetectionResult {
        match self.fetch_signals(url).await {
            Ok(signals) => detect(&signals, self.registry),
            Err(e) => {
                warn!(%url, error = %truncate_for_log(&e.to_string(), 200), "Article analysis failed");
                ArticleDetectionResult::failed(url, e.to_string())
            }
        }
    }

    async fn fetch_signals(&self, url: &str) -> Result<ArticlePageSignals, ArticleError> {
        let session = self.browser.session()?;
        let page = self
            .renderer
            .render(&session, url, self.timeouts.article)
            .await?;
        Ok(extract_signals(&page)?)
    }

    async fn discover_links(&self, url: &str, domain: &str) -> Result<Vec<String>, SiteError> {
        let session = self.browser.session()?;
        let page = self
            .renderer
            .render(&session, url, self.timeouts.discovery)
            .await?;
        Ok(self.discovery.discover(&page, domain))
    }
}

/// Host of an absolute http(s) URL.
fn site_domain(input_url: &str) -> Result<String, SiteError> {
    let invalid = || SiteError::InvalidUrl(input_url.to_string());
    let parsed = Url::parse(input_url).map_err(|_| invalid())?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(invalid());
    }
    parsed.host_str().map(str::to_string).ok_or_else(invalid)
}

fn site_failure(input_url: &str, domain: &str, error: SiteError, started: Instant) -> SiteAnalysisResult {
    warn!(%input_url, error = %error, "Site analysis failed");
    let mut result = SiteAnalysisResult::failed(input_url, domain, error.to_string());
    result.processing_duration = format_elapsed(started.elapsed());
    result
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{DEFAULT_USER_AGENT, PageSession, RenderedPage};
    use crate::errors::NavigationError;
    use crate::models::DetectionChannel;
    use crate::scrapers::HeuristicLinkDiscovery;
    use std::cell::RefCell;
    use std::collections::HashMap;

    enum FakePage {
        Html(String),
        Unreachable,
    }

    /// Serves canned pages and remembers what was requested.
    #[derive(Default)]
    struct FakeRenderer {
        pages: HashMap<String, FakePage>,
        requested: RefCell<Vec<String>>,
    }

    impl FakeRenderer {
        fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), FakePage::Html(html.to_string()));
            self
        }

        fn unreachable(mut self, url: &str) -> Self {
            self.pages.insert(url.to_string(), FakePage::Unreachable);
            self
        }

        fn front_page(self, site: &str, paths: &[String]) -> Self {
            let anchors: String = paths
                .iter()
                .map(|p| format!(r#"<a href="{p}">Story</a>"#))
                .collect();
            self.page(site, &format!("<html><body>{anchors}</body></html>"))
        }
    }

    impl PageRenderer for FakeRenderer {
        async fn render(
            &self,
            _session: &PageSession,
            url: &str,
            timeout: Duration,
        ) -> Result<RenderedPage, NavigationError> {
            self.requested.borrow_mut().push(url.to_string());
            match self.pages.get(url) {
                Some(FakePage::Html(html)) => Ok(RenderedPage::new(url, html.clone())),
                Some(FakePage::Unreachable) => Err(NavigationError::Timeout {
                    url: url.to_string(),
                    timeout,
                }),
                None => Err(NavigationError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }

    const CLEAN: &str = "<html><head><title>Local news</title></head><body>\
        <p>The city council met on Tuesday evening to discuss budgets.</p></body></html>";
    const REUTERS_BYLINE: &str = "<html><head><title>Markets</title></head><body>\
        <div class=\"byline\">Reuters</div><p>Stocks climbed on Wednesday after the report.</p></body></html>";
    const REUTERS_LEAD: &str = "<html><head><title>Markets</title></head><body>\
        <p>By John Smith, Reuters. Stocks climbed on Wednesday after the report.</p></body></html>";

    fn news_paths(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("/news/{i}")).collect()
    }

    fn orchestrator(renderer: FakeRenderer) -> BatchOrchestrator<FakeRenderer, HeuristicLinkDiscovery> {
        let browser = BrowserHandle::launch(DEFAULT_USER_AGENT).unwrap();
        BatchOrchestrator::new(browser, renderer, HeuristicLinkDiscovery).with_pacing(PacingPolicy::none())
    }

    fn wire_site() -> FakeRenderer {
        let mut renderer = FakeRenderer::default().front_page("https://example.com/", &news_paths(10));
        for i in 0..10 {
            let url = format!("https://example.com/news/{i}");
            renderer = match i {
                1 | 7 => renderer.page(&url, REUTERS_BYLINE),
                4 => renderer.page(&url, REUTERS_LEAD),
                5 => renderer.unreachable(&url),
                _ => renderer.page(&url, CLEAN),
            };
        }
        renderer
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_wire_service_site_verdict() {
        let orchestrator = orchestrator(wire_site());
        let batch = orchestrator
            .run(&urls(&["https://example.com/"]), SampleBounds::default(), &mut |_: &str| {})
            .await;

        let site = &batch.results[0];
        assert!(site.error.is_none());
        assert_eq!(site.domain, "example.com");
        assert_eq!(site.articles_analyzed, 10);
        assert_eq!(site.articles_with_wire_services, 3);
        assert_eq!(site.consistent_services, vec!["Reuters"]);
        assert_eq!(site.per_service_stats["Reuters"].percentage, 30);
        assert_eq!(site.confidence_score, 60);
        assert_eq!(
            site.sample_bylines,
            vec!["Reuters", "By John Smith, Reuters"]
        );

        let lead = &site.article_results[4];
        assert_eq!(lead.detection_channels, vec![DetectionChannel::ContentPatterns]);

        let failed = &site.article_results[5];
        assert!(failed.error.as_deref().unwrap().contains("Navigation timeout"));
        assert!(failed.matched_services.is_empty());

        assert_eq!(batch.summary.sites_with_wire_services, 1);
        assert_eq!(batch.summary.average_confidence, 60);
    }

    #[tokio::test]
    async fn test_sessions_are_released_on_every_path() {
        let orchestrator = orchestrator(wire_site());
        orchestrator
            .run(&urls(&["https://example.com/"]), SampleBounds::default(), &mut |_: &str| {})
            .await;

        assert_eq!(orchestrator.browser().open_sessions(), 0);
        assert_eq!(orchestrator.browser().issued_sessions(), 11);
        orchestrator.shutdown();
        assert!(orchestrator.browser().is_closed());
    }

    #[tokio::test]
    async fn test_output_order_matches_filtered_input() {
        let renderer = FakeRenderer::default()
            .front_page("https://b.example/", &news_paths(1))
            .page("https://b.example/news/0", CLEAN)
            .front_page("https://a.example/", &news_paths(1))
            .page("https://a.example/news/0", CLEAN);
        let orchestrator = orchestrator(renderer);

        let batch = orchestrator
            .run(
                &urls(&["https://b.example/", "   ", "", "https://a.example/"]),
                SampleBounds::default(),
                &mut |_: &str| {},
            )
            .await;

        let domains: Vec<&str> = batch.results.iter().map(|r| r.domain.as_str()).collect();
        assert_eq!(domains, vec!["b.example", "a.example"]);
        assert_eq!(batch.summary.total_sites, 2);
        assert_eq!(batch.summary.total_articles_analyzed, 2);
        assert_eq!(batch.summary.average_confidence, 0);
    }

    #[tokio::test]
    async fn test_sample_is_capped_and_in_discovery_order() {
        let mut renderer = FakeRenderer::default().front_page("https://example.com/", &news_paths(20));
        for i in 0..20 {
            renderer = renderer.page(&format!("https://example.com/news/{i}"), CLEAN);
        }
        let orchestrator = orchestrator(renderer);
        let bounds = SampleBounds {
            min_articles: 2,
            max_articles: 5,
        };

        let batch = orchestrator
            .run(&urls(&["https://example.com/"]), bounds, &mut |_: &str| {})
            .await;

        let sampled: Vec<&str> = batch.results[0]
            .article_results
            .iter()
            .map(|r| r.source_url.as_str())
            .collect();
        assert_eq!(
            sampled,
            (0..5).map(|i| format!("https://example.com/news/{i}")).collect::<Vec<_>>()
        );
        assert_eq!(orchestrator.renderer.requested.borrow().len(), 6);
    }

    #[tokio::test]
    async fn test_site_failures_do_not_abort_batch() {
        let renderer = FakeRenderer::default()
            .page("https://empty.example/", "<html><body><a href=\"/about\">About</a></body></html>")
            .unreachable("https://down.example/")
            .front_page("https://ok.example/", &news_paths(1))
            .page("https://ok.example/news/0", CLEAN);
        let orchestrator = orchestrator(renderer);

        let batch = orchestrator
            .run(
                &urls(&["not a url", "https://empty.example/", "https://down.example/", "https://ok.example/"]),
                SampleBounds::default(),
                &mut |_: &str| {},
            )
            .await;

        let errors: Vec<Option<&str>> = batch.results.iter().map(|r| r.error.as_deref()).collect();
        assert_eq!(errors[0], Some("Invalid URL: not a url"));
        assert_eq!(errors[1], Some("No articles found on this site"));
        assert!(errors[2].unwrap().starts_with("Error finding articles: Navigation timeout"));
        assert_eq!(errors[3], None);

        for failed in &batch.results[..3] {
            assert_eq!(failed.articles_analyzed, 0);
            assert_eq!(failed.confidence_score, 0);
        }
        assert_eq!(batch.results[1].domain, "empty.example");
        assert_eq!(orchestrator.browser().open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_extraction_failure_is_isolated() {
        let renderer = FakeRenderer::default()
            .front_page("https://example.com/", &news_paths(3))
            .page("https://example.com/news/0", REUTERS_BYLINE)
            .page("https://example.com/news/1", "")
            .page("https://example.com/news/2", REUTERS_BYLINE);
        let orchestrator = orchestrator(renderer);

        let site = orchestrator
            .analyze_site("https://example.com/", SampleBounds::default(), &mut |_: &str| {})
            .await;

        let broken = &site.article_results[1];
        assert!(broken.error.as_deref().unwrap().contains("empty document"));
        assert!(broken.matched_services.is_empty());
        assert_eq!(site.per_service_stats["Reuters"].count, 2);
        assert_eq!(site.articles_analyzed, 3);
    }

    #[tokio::test]
    async fn test_progress_messages() {
        let renderer = FakeRenderer::default()
            .front_page("https://example.com/", &news_paths(2))
            .page("https://example.com/news/0", CLEAN)
            .page("https://example.com/news/1", CLEAN);
        let orchestrator = orchestrator(renderer);

        let mut messages = Vec::new();
        orchestrator
            .run(&urls(&["https://example.com/"]), SampleBounds::default(), &mut |m: &str| {
                messages.push(m.to_string())
            })
            .await;

        assert_eq!(
            messages,
            vec![
                "🛰️ Starting wire service analysis of 1 site(s)...",
                "🌐 Processing site 1/1: example.com",
                "🚀 Starting analysis of example.com...",
                "🔍 Discovering articles on example.com...",
                "📊 Found 2 articles, analyzing 2...",
                "📄 Analyzing article 1/2: /news/0...",
                "📄 Analyzing article 2/2: /news/1...",
            ]
        );
    }

    #[tokio::test]
    async fn test_article_pacing_is_applied_between_fetches() {
        let renderer = FakeRenderer::default()
            .front_page("https://example.com/", &news_paths(3))
            .page("https://example.com/news/0", CLEAN)
            .page("https://example.com/news/1", CLEAN)
            .page("https://example.com/news/2", CLEAN);
        let orchestrator = orchestrator(renderer).with_pacing(PacingPolicy {
            article_delay: Duration::from_millis(25),
            site_delay: Duration::ZERO,
        });

        let started = Instant::now();
        orchestrator
            .analyze_site("https://example.com/", SampleBounds::default(), &mut |_: &str| {})
            .await;
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_site_domain() {
        assert_eq!(site_domain("https://www.example.com/world").unwrap(), "www.example.com");
        assert!(site_domain("example.com").is_err());
        assert!(site_domain("ftp://example.com").is_err());
    }
}
