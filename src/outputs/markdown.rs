//! Markdown rendering of a batch report for human reading.

use crate::models::{BatchResult, SiteAnalysisResult};
use std::fmt::Write;

/// Render the whole batch: a summary table followed by one section per site.
pub fn batch_to_markdown(batch: &BatchResult) -> String {
    let mut md = String::new();
    let summary = &batch.summary;

    let _ = writeln!(md, "# Wire Service Report\n");
    let _ = writeln!(md, "_Generated {}_\n", batch.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(md, "| Sites | Using wire services | Articles analyzed | Average confidence |");
    let _ = writeln!(md, "|------:|-------------------:|------------------:|-------------------:|");
    let _ = writeln!(
        md,
        "| {} | {} | {} | {}% |\n",
        summary.total_sites,
        summary.sites_with_wire_services,
        summary.total_articles_analyzed,
        summary.average_confidence
    );

    for site in &batch.results {
        site_section(&mut md, site);
    }
    md
}

fn site_section(md: &mut String, site: &SiteAnalysisResult) {
    let heading = if site.domain.is_empty() { &site.input_url } else { &site.domain };
    let _ = writeln!(md, "## {heading}\n");

    if let Some(ref error) = site.error {
        let _ = writeln!(md, "**Error:** {error}\n");
        return;
    }

    let verdict = if site.uses_wire_services() {
        site.consistent_services.join(", ")
    } else {
        "No consistent wire service use detected".to_string()
    };
    let _ = writeln!(md, "- **Verdict:** {verdict}");
    let _ = writeln!(md, "- **Confidence:** {}%", site.confidence_score);
    let _ = writeln!(
        md,
        "- **Articles:** {} analyzed, {} with wire attribution",
        site.articles_analyzed, site.articles_with_wire_services
    );
    let _ = writeln!(md, "- **Processing time:** {}\n", site.processing_duration);

    if !site.per_service_stats.is_empty() {
        let _ = writeln!(md, "| Service | Articles | Share | Evidence |");
        let _ = writeln!(md, "|---------|---------:|------:|----------|");
        for service in &site.consistent_services {
            let Some(stats) = site.per_service_stats.get(service) else {
                continue;
            };
            let evidence = stats
                .evidence_articles
                .iter()
                .map(|a| format!("[{}]({})", a.evidence_snippets.first().map_or("link", String::as_str), a.url))
                .collect::<Vec<_>>()
                .join("<br>");
            let _ = writeln!(md, "| {} | {} | {}% | {} |", service, stats.count, stats.percentage, evidence);
        }
        let _ = writeln!(md);
    }

    if !site.sample_bylines.is_empty() {
        let _ = writeln!(md, "### Sample bylines\n");
        for byline in &site.sample_bylines {
            let _ = writeln!(md, "> {byline}\n");
        }
    }

    let failures: Vec<_> = site.article_results.iter().filter(|a| a.error.is_some()).collect();
    if !failures.is_empty() {
        let _ = writeln!(md, "### Articles that could not be analyzed\n");
        for article in failures {
            let _ = writeln!(md, "- {}: {}", article.source_url, article.error.as_deref().unwrap_or_default());
        }
        let _ = writeln!(md);
    }
}
