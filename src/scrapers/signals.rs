//! Attribution signal extraction from a rendered article page.
//!
//! Pulls the handful of page regions that carry attribution: the title, the
//! start of the visible body text, elements styled as bylines, author meta
//! tags, and the first few paragraphs.

use crate::browser::RenderedPage;
use crate::errors::ExtractionError;
use crate::models::ArticlePageSignals;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

/// Characters of visible body text kept in the excerpt.
pub const BODY_EXCERPT_CHARS: usize = 5000;
/// Paragraphs considered for the lead.
pub const LEAD_PARAGRAPHS: usize = 5;
/// Lead paragraphs must be longer than this many characters.
pub const MIN_LEAD_PARAGRAPH_CHARS: usize = 20;

/// Class name fragments that mark attribution regions, matched case-insensitively.
const BYLINE_CLASS_HINTS: [&str; 4] = ["byline", "author", "writer", "reporter"];

static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static BODY: Lazy<Selector> = Lazy::new(|| selector("body"));
static CLASSED: Lazy<Selector> = Lazy::new(|| selector("[class]"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| selector("p"));
static META_AUTHOR: Lazy<[Selector; 3]> = Lazy::new(|| {
    [
        selector(r#"meta[name="author"]"#),
        selector(r#"meta[property="article:author"]"#),
        selector(r#"meta[name="twitter:creator"]"#),
    ]
});

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// Extract [`ArticlePageSignals`] from a rendered page.
///
/// # Errors
///
/// Returns [`ExtractionError::EmptyDocument`] when the page has no markup.
#[instrument(level = "debug", skip_all, fields(url = %page.url))]
pub fn extract_signals(page: &RenderedPage) -> Result<ArticlePageSignals, ExtractionError> {
    if page.html.trim().is_empty() {
        return Err(ExtractionError::EmptyDocument {
            url: page.url.clone(),
        });
    }

    let document = Html::parse_document(&page.html);

    let title = document
        .select(&TITLE)
        .next()
        .map(element_text)
        .unwrap_or_default();

    let body_excerpt = document
        .select(&BODY)
        .next()
        .map(|body| element_text(body).chars().take(BODY_EXCERPT_CHARS).collect())
        .unwrap_or_default();

    let byline_candidates = BYLINE_CLASS_HINTS
        .iter()
        .flat_map(|hint| {
            document.select(&CLASSED).filter(move |el| {
                el.value()
                    .attr("class")
                    .is_some_and(|class| class.to_lowercase().contains(hint))
            })
        })
        .map(element_text)
        .filter(|text| !text.is_empty())
        .unique()
        .collect::<Vec<_>>();

    let meta_author_values = META_AUTHOR
        .iter()
        .flat_map(|sel| document.select(sel))
        .filter_map(|el| {
            let attrs = el.value();
            attrs
                .attr("content")
                .filter(|c| !c.is_empty())
                .or_else(|| attrs.attr("value"))
                .map(|v| v.trim().to_string())
        })
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>();

    let lead_paragraphs = document
        .select(&PARAGRAPH)
        .take(LEAD_PARAGRAPHS)
        .map(element_text)
        .filter(|text| text.chars().count() > MIN_LEAD_PARAGRAPH_CHARS)
        .collect::<Vec<_>>();

    debug!(
        bylines = byline_candidates.len(),
        meta = meta_author_values.len(),
        paragraphs = lead_paragraphs.len(),
        "Extracted page signals"
    );

    Ok(ArticlePageSignals {
        source_url: page.url.clone(),
        title,
        body_excerpt,
        byline_candidates,
        meta_author_values,
        lead_paragraphs,
    })
}

/// Visible text of an element with whitespace collapsed.
fn element_text(el: ElementRef<'_>) -> String {
    el.text().flat_map(str::split_whitespace).join(" ")
}
