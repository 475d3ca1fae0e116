//! Runtime settings: defaults, optional YAML file, then CLI/env overrides.
//!
//! ```yaml
//! # settings.yaml
//! min_articles: 8
//! max_articles: 15
//! article_delay_ms: 1000
//! site_delay_ms: 2000
//! article_timeout_secs: 15
//! discovery_timeout_secs: 20
//! max_sites: 5
//! ```

use crate::browser::DEFAULT_USER_AGENT;
use crate::cli::Cli;
use crate::orchestrator::{NavigationTimeouts, PacingPolicy, SampleBounds};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{info, instrument};

/// Invalid settings or batch input, caught before any site is analyzed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("min_articles must be at least 1")]
    ZeroMinArticles,

    #[error("max_articles ({max}) must be at least min_articles ({min})")]
    InvalidBounds { min: usize, max: usize },

    #[error("Please provide at least one URL")]
    NoSites,

    #[error("Maximum {max} sites allowed per request, got {given}")]
    TooManySites { max: usize, given: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub min_articles: usize,
    pub max_articles: usize,
    pub article_delay_ms: u64,
    pub site_delay_ms: u64,
    pub article_timeout_secs: u64,
    pub discovery_timeout_secs: u64,
    pub max_sites: usize,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_articles: 8,
            max_articles: 15,
            article_delay_ms: 1000,
            site_delay_ms: 2000,
            article_timeout_secs: 15,
            discovery_timeout_secs: 20,
            max_sites: 5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Settings {
    /// Defaults, overlaid with the YAML file at `path` when given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path).await?;
        let settings = Self::from_yaml(&raw)?;
        info!(path, "Loaded settings file");
        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Let explicit CLI flags (or their env vars) win.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(v) = cli.min_articles {
            self.min_articles = v;
        }
        if let Some(v) = cli.max_articles {
            self.max_articles = v;
        }
        if let Some(v) = cli.article_delay_ms {
            self.article_delay_ms = v;
        }
        if let Some(v) = cli.site_delay_ms {
            self.site_delay_ms = v;
        }
        if let Some(v) = cli.article_timeout_secs {
            self.article_timeout_secs = v;
        }
        if let Some(v) = cli.discovery_timeout_secs {
            self.discovery_timeout_secs = v;
        }
        if let Some(v) = cli.max_sites {
            self.max_sites = v;
        }
        if let Some(ref v) = cli.user_agent {
            self.user_agent = v.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_articles == 0 {
            return Err(ConfigError::ZeroMinArticles);
        }
        if self.max_articles < self.min_articles {
            return Err(ConfigError::InvalidBounds {
                min: self.min_articles,
                max: self.max_articles,
            });
        }
        Ok(())
    }

    /// Reject batches that are empty or larger than `max_sites`.
    pub fn validate_urls(&self, urls: &[String]) -> Result<(), ConfigError> {
        if urls.iter().all(|u| u.trim().is_empty()) {
            return Err(ConfigError::NoSites);
        }
        if urls.len() > self.max_sites {
            return Err(ConfigError::TooManySites {
                max: self.max_sites,
                given: urls.len(),
            });
        }
        Ok(())
    }

    pub fn bounds(&self) -> SampleBounds {
        SampleBounds {
            min_articles: self.min_articles,
            max_articles: self.max_articles,
        }
    }

    pub fn pacing(&self) -> PacingPolicy {
        PacingPolicy {
            article_delay: Duration::from_millis(self.article_delay_ms),
            site_delay: Duration::from_millis(self.site_delay_ms),
        }
    }

    pub fn timeouts(&self) -> NavigationTimeouts {
        NavigationTimeouts {
            discovery: Duration::from_secs(self.discovery_timeout_secs),
            article: Duration::from_secs(self.article_timeout_secs),
        }
    }
}
