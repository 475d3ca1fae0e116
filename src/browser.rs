//! The long-lived rendering resource and the pages it renders.
//!
//! A [`BrowserHandle`] is acquired once per batch. Each page is rendered inside
//! a short-lived [`PageSession`] lease that releases itself when dropped, so a
//! session is returned on every exit path: success, navigation error, or
//! extraction error.
//!
//! [`PageRenderer`] is the seam between the orchestrator and whatever turns a
//! URL into markup. [`HttpRenderer`] is the shipped implementation: it fetches
//! the server-rendered HTML with a desktop browser user agent.

use crate::errors::NavigationError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// User agent sent with every page request unless overridden.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Markup for one rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// The URL that was requested.
    pub url: String,
    /// The URL the page settled on after redirects.
    pub final_url: String,
    pub html: String,
}

impl RenderedPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            html: html.into(),
        }
    }
}

#[derive(Debug)]
struct BrowserInner {
    client: reqwest::Client,
    open_sessions: AtomicUsize,
    issued_sessions: AtomicUsize,
    closed: AtomicBool,
}

/// Shared handle to the rendering resource.
#[derive(Debug, Clone)]
pub struct BrowserHandle {
    inner: Arc<BrowserInner>,
}

impl BrowserHandle {
    /// Build the underlying HTTP client.
    #[instrument(level = "info", skip_all)]
    pub fn launch(user_agent: &str) -> Result<Self, NavigationError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| NavigationError::Load {
                url: String::new(),
                message: format!("failed to launch browser: {e}"),
            })?;

        info!("Browser launched");
        Ok(Self {
            inner: Arc::new(BrowserInner {
                client,
                open_sessions: AtomicUsize::new(0),
                issued_sessions: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Lease a session for rendering one page.
    pub fn session(&self) -> Result<PageSession, NavigationError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(NavigationError::BrowserClosed);
        }
        let id = self.inner.issued_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.open_sessions.fetch_add(1, Ordering::SeqCst);
        debug!(session = id, "Session opened");
        Ok(PageSession {
            id,
            inner: Arc::clone(&self.inner),
        })
    }

    /// Sessions leased and not yet dropped.
    pub fn open_sessions(&self) -> usize {
        self.inner.open_sessions.load(Ordering::SeqCst)
    }

    /// Sessions leased over the handle's lifetime.
    pub fn issued_sessions(&self) -> usize {
        self.inner.issued_sessions.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Refuse further sessions. Idempotent.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let open = self.open_sessions();
        if open > 0 {
            warn!(open, "Browser closed with sessions still open");
        } else {
            info!(issued = self.issued_sessions(), "Browser closed");
        }
    }
}

/// A scoped lease on the browser, released on drop.
#[derive(Debug)]
pub struct PageSession {
    id: usize,
    inner: Arc<BrowserInner>,
}

impl PageSession {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.inner.client
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        self.inner.open_sessions.fetch_sub(1, Ordering::SeqCst);
        debug!(session = self.id, "Session released");
    }
}

/// Turns a URL into markup within a session, bounded by `timeout`.
///
/// Implementations must enforce the timeout themselves and report every
/// navigation fault as a [`NavigationError`].
pub trait PageRenderer {
    async fn render(
        &self,
        session: &PageSession,
        url: &str,
        timeout: Duration,
    ) -> Result<RenderedPage, NavigationError>;
}

/// Renders pages by fetching their server-side HTML.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpRenderer;

impl PageRenderer for HttpRenderer {
    #[instrument(level = "info", skip(self, session), fields(session = session.id()))]
    async fn render(
        &self,
        session: &PageSession,
        url: &str,
        timeout: Duration,
    ) -> Result<RenderedPage, NavigationError> {
        let t0 = Instant::now();
        let fetch = async {
            let resp = session
                .client()
                .get(url)
                .send()
                .await
                .map_err(|e| load_error(url, e))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(NavigationError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            let final_url = resp.url().to_string();
            let html = resp.text().await.map_err(|e| load_error(url, e))?;
            Ok::<_, NavigationError>(RenderedPage {
                url: url.to_string(),
                final_url,
                html,
            })
        };

        let page = tokio::time::timeout(timeout, fetch)
            .await
            .map_err(|_| NavigationError::Timeout {
                url: url.to_string(),
                timeout,
            })??;

        debug!(
            bytes = page.html.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Page rendered"
        );
        Ok(page)
    }
}

fn load_error(url: &str, e: reqwest::Error) -> NavigationError {
    NavigationError::Load {
        url: url.to_string(),
        message: e.to_string(),
    }
}
