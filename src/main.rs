//! `feedfetch` binary: load a config file and poll its sources until Ctrl-C.
//!
//! ```text
//! feedfetch [CONFIG]        # defaults to $FEEDFETCH_CONFIG, then ./feedfetch.toml
//! ```
//!
//! Stored articles are written as JSON lines to the configured `output` file,
//! or to stdout.  Logs go to stderr.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use feedfetch::config::ENV_PATH;
use feedfetch::{
    ArticleSink, Config, FetchError, Fetcher, HttpAdapterFactory, JsonLinesSink, StaticCatalog,
};

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// `RUST_LOG` wins; otherwise the config's `log_level`, otherwise `info`.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.log_level.as_deref().unwrap_or("info"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn open_sink(config: &Config) -> Result<Arc<dyn ArticleSink>> {
    let sink: Arc<dyn ArticleSink> = match &config.output {
        Some(path) => Arc::new(JsonLinesSink::open(path)?),
        None => Arc::new(JsonLinesSink::new(std::io::stdout())),
    };
    Ok(sink)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // -- configuration -------------------------------------------------------
    let path = Config::resolve_path(std::env::args().nth(1), std::env::var(ENV_PATH).ok());
    let config = Config::load_from(&path)?;
    init_tracing(&config);

    tracing::info!(
        config = %path.display(),
        sources = config.sources.len(),
        keywords = config.filter_keywords.len(),
        "configuration loaded"
    );
    if config.has_empty_keyword() {
        tracing::warn!("filter_keywords contains an empty keyword; every item will be skipped");
    }
    for keyword in config.uppercase_keywords() {
        tracing::warn!(keyword, "keyword has upper-case letters and will only match categories, never titles");
    }

    // -- collaborators -------------------------------------------------------
    let catalog = Arc::new(StaticCatalog::new(config.sources.clone()));
    if catalog.is_empty() {
        tracing::warn!("no sources configured; every cycle will be empty");
    }
    let sink = open_sink(&config)?;
    let factory = Arc::new(
        HttpAdapterFactory::with_timeout(config.request_timeout(), &config.user_agent)
            .context("building HTTP client")?,
    );
    let fetcher = Fetcher::new(catalog, sink, factory, config.fetcher_config());

    // -- shutdown on Ctrl-C ----------------------------------------------------
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("received Ctrl-C, shutting down");
                trigger.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "cannot listen for Ctrl-C"),
        }
    });

    match fetcher.start(&cancel).await {
        FetchError::Cancelled => Ok(()),
        err => Err(err.into()),
    }
}
