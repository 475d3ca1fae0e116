//! Failure taxonomy for the analysis pipeline.
//!
//! Errors never cross their unit of work: an [`ArticleError`] is folded into an
//! error-tagged article result, a [`SiteError`] into an error-tagged site
//! result. Only the host binary sees `Box<dyn Error>`.

use std::time::Duration;
use thiserror::Error;

/// A page could not be rendered within its timeout, or failed to load.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Navigation timeout of {}ms exceeded for {url}", .timeout.as_millis())]
    Timeout { url: String, timeout: Duration },

    #[error("Failed to load {url}: {message}")]
    Load { url: String, message: String },

    #[error("HTTP {status} while loading {url}")]
    Status { url: String, status: u16 },

    #[error("Browser has been closed")]
    BrowserClosed,
}

/// A page loaded but its attribution signals could not be extracted.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Page {url} produced an empty document")]
    EmptyDocument { url: String },
}

/// Anything that can go wrong while acquiring one article's signals.
#[derive(Debug, Error)]
pub enum ArticleError {
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Failures that end a site's analysis before any article is sampled.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("No articles found on this site")]
    NoArticlesFound,

    #[error("Error finding articles: {0}")]
    Discovery(#[from] NavigationError),
}
