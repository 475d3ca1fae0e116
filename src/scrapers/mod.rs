//! HTML scrapers that turn rendered pages into pipeline inputs.
//!
//! Both scrapers work on a [`RenderedPage`](crate::browser::RenderedPage)
//! produced by a [`PageRenderer`](crate::browser::PageRenderer):
//!
//! | Scraper | Module | Input page | Output |
//! |---------|--------|------------|--------|
//! | Link discovery | [`links`] | Site front page | Candidate article URLs |
//! | Signal extraction | [`signals`] | Article page | [`ArticlePageSignals`](crate::models::ArticlePageSignals) |
//!
//! Selectors and patterns are compiled once and shared.

pub mod links;
pub mod signals;

pub use links::{HeuristicLinkDiscovery, LinkDiscovery};
pub use signals::extract_signals;
