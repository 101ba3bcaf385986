//! TOML configuration for the `feedfetch` binary.
//!
//! ```toml
//! fetch_interval_secs = 300
//! filter_keywords = ["politics", "sponsored"]
//! max_concurrency = 8
//!
//! [[sources]]
//! id = 1
//! name = "Go blog"
//! feed_url = "https://go.dev/blog/feed.atom"
//! kind = "atom"
//! ```

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::fetcher::FetcherConfig;
use crate::source::SourceDescriptor;

/// Environment variable naming the config file when no argument is given.
pub const ENV_PATH: &str = "FEEDFETCH_CONFIG";
const DEFAULT_PATH: &str = "feedfetch.toml";

fn default_fetch_interval_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("feedfetch/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_fetch_interval_secs")]
    pub fetch_interval_secs: u64,

    /// Matched verbatim against categories and as substrings of lower-cased
    /// titles.
    #[serde(default)]
    pub filter_keywords: Vec<String>,

    /// Cap on sources fetched at once; unbounded when absent.
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_level: Option<String>,

    /// JSON-lines output file; stdout when absent.
    #[serde(default)]
    pub output: Option<PathBuf>,

    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,
}

impl Config {
    /// Parse and validate a config document.
    pub fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("invalid config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("loading {}", path.display()))
    }

    /// Pick the config path: explicit argument, then `$FEEDFETCH_CONFIG`, then
    /// `feedfetch.toml` in the working directory.
    pub fn resolve_path(arg: Option<String>, env: Option<String>) -> PathBuf {
        arg.or(env)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PATH))
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            fetch_interval: Duration::from_secs(self.fetch_interval_secs),
            filter_keywords: self.filter_keywords.clone(),
            max_concurrency: self.max_concurrency.and_then(NonZeroUsize::new),
        }
    }

    /// An empty keyword matches every title, so it filters out everything.
    pub fn has_empty_keyword(&self) -> bool {
        self.filter_keywords.iter().any(String::is_empty)
    }

    /// Keywords containing upper-case letters.  Titles are lower-cased before
    /// matching, so these can only ever match a category.
    pub fn uppercase_keywords(&self) -> Vec<&str> {
        self.filter_keywords
            .iter()
            .filter(|kw| kw.chars().any(char::is_uppercase))
            .map(String::as_str)
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.fetch_interval_secs == 0 {
            bail!("fetch_interval_secs must be greater than zero");
        }
        if self.max_concurrency == Some(0) {
            bail!("max_concurrency must be greater than zero when set");
        }

        let mut ids = HashSet::new();
        for source in &self.sources {
            if !ids.insert(source.id) {
                bail!("duplicate source id {}", source.id);
            }
        }
        Ok(())
    }
}
