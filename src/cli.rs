//! Command-line interface definitions for the wire service detector.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Tuning knobs can also come from environment variables or a YAML config
//! file; explicit flags win over both.

use clap::Parser;

/// Command-line arguments for the wire service detector.
///
/// # Examples
///
/// ```sh
/// # Analyze two sites with the default sample size
/// wire_service_detector https://example-gazette.com https://example-herald.com
///
/// # Larger sample, write JSON and Markdown reports
/// wire_service_detector --max-articles 25 -j ./json -m ./markdown https://example-gazette.com
///
/// # Stream progress events as NDJSON
/// wire_service_detector --ndjson https://example-gazette.com
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Site URLs to analyze, in order
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Sample size at which a verdict earns full confidence
    #[arg(long, env = "WIRE_MIN_ARTICLES")]
    pub min_articles: Option<usize>,

    /// Maximum number of articles sampled per site
    #[arg(long, env = "WIRE_MAX_ARTICLES")]
    pub max_articles: Option<usize>,

    /// Delay between article fetches within a site, in milliseconds
    #[arg(long, env = "WIRE_ARTICLE_DELAY_MS")]
    pub article_delay_ms: Option<u64>,

    /// Delay between sites, in milliseconds
    #[arg(long, env = "WIRE_SITE_DELAY_MS")]
    pub site_delay_ms: Option<u64>,

    /// Navigation timeout for article pages, in seconds
    #[arg(long)]
    pub article_timeout_secs: Option<u64>,

    /// Navigation timeout for front pages, in seconds
    #[arg(long)]
    pub discovery_timeout_secs: Option<u64>,

    /// Maximum number of sites accepted per batch
    #[arg(long, env = "WIRE_MAX_SITES")]
    pub max_sites: Option<usize>,

    /// User agent sent with page requests
    #[arg(long, env = "WIRE_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Output directory for the JSON report
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Output directory for the Markdown report
    #[arg(short, long)]
    pub markdown_output_dir: Option<String>,

    /// Write progress and the final report to stdout as NDJSON events
    #[arg(long)]
    pub ndjson: bool,
}
