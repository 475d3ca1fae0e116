//! # Wire Service Detector
//!
//! Determines whether a news site's articles are syndicated from wire services
//! (Associated Press, Reuters, AFP, ...) rather than written by its own staff.
//! For each site it samples a set of article pages, scans each one for
//! attribution signals through several independent channels, and aggregates
//! the evidence into a verdict with a 0-100 confidence score.
//!
//! ## Usage
//!
//! ```sh
//! wire_service_detector https://example-gazette.com https://example-herald.com
//! ```
//!
//! ## Architecture
//!
//! 1. **Discovery**: Render the front page and collect candidate article links
//! 2. **Sampling**: Render up to `max_articles` articles, one at a time, with a pause between each
//! 3. **Detection**: Scan bylines, author meta tags, lead copy, and the URL for wire service patterns
//! 4. **Aggregation**: Keep services seen on enough articles and score the verdict
//! 5. **Output**: Print the JSON report and optionally write JSON/Markdown files

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod browser;
mod cli;
mod config;
mod detector;
mod errors;
mod models;
mod orchestrator;
mod outputs;
mod registry;
mod scrapers;
mod utils;

use browser::{BrowserHandle, HttpRenderer};
use cli::Cli;
use config::Settings;
use orchestrator::BatchOrchestrator;
use outputs::{json, markdown};
use scrapers::HeuristicLinkDiscovery;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init (stderr; stdout carries the report) ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("wire_service_detector starting up");

    // Parse CLI and layer settings
    let args = Cli::parse();
    debug!(?args.urls, ?args.config, "Parsed CLI arguments");

    let mut settings = Settings::load(args.config.as_deref()).await?;
    settings.apply_cli(&args);
    settings.validate()?;
    settings.validate_urls(&args.urls)?;
    info!(
        min_articles = settings.min_articles,
        max_articles = settings.max_articles,
        article_delay_ms = settings.article_delay_ms,
        site_delay_ms = settings.site_delay_ms,
        "Settings resolved"
    );

    // Early check: ensure output dirs are writable before spending time on sites
    for dir in [&args.json_output_dir, &args.markdown_output_dir].into_iter().flatten() {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Output directory is not writable");
            return Err(e);
        }
    }

    // ---- Analyze ----
    let browser = BrowserHandle::launch(&settings.user_agent)?;
    let orchestrator = BatchOrchestrator::new(browser, HttpRenderer, HeuristicLinkDiscovery)
        .with_pacing(settings.pacing())
        .with_timeouts(settings.timeouts());

    let ndjson = args.ndjson;
    let mut progress = |message: &str| {
        if ndjson {
            match json::progress_line(message) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(error = %e, "Failed to encode progress event"),
            }
        } else {
            info!(target: "progress", "{message}");
        }
    };

    let batch = tokio::select! {
        batch = orchestrator.run(&args.urls, settings.bounds(), &mut progress) => batch,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; closing browser");
            orchestrator.shutdown();
            return Err("interrupted before the batch completed".into());
        }
    };
    orchestrator.shutdown();

    // ---- Output ----
    if ndjson {
        println!("{}", json::complete_line(&batch)?);
    } else {
        println!("{}", json::to_pretty_json(&batch)?);
    }

    if let Some(ref dir) = args.json_output_dir {
        if let Err(e) = json::write_batch(&batch, dir).await {
            error!(error = %e, "Failed to write JSON report");
        }
    }

    if let Some(ref dir) = args.markdown_output_dir {
        let path = format!(
            "{}/{}.md",
            dir.trim_end_matches('/'),
            batch.generated_at.format("%Y-%m-%d_%H%M%S")
        );
        info!(path = %path, "Writing Markdown");
        if let Err(e) = tokio::fs::write(&path, markdown::batch_to_markdown(&batch)).await {
            error!(path = %path, error = %e, "Failed writing Markdown");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        sites = batch.summary.total_sites,
        sites_with_wire_services = batch.summary.sites_with_wire_services,
        articles = batch.summary.total_articles_analyzed,
        average_confidence = batch.summary.average_confidence,
        "Execution complete"
    );

    Ok(())
}
