//! Periodic fetch orchestration.
//!
//! [`Fetcher::start`] runs one cycle immediately and then one per
//! `fetch_interval` until the cancellation token fires.  A cycle
//! ([`Fetcher::fetch`]) loads the source list, spawns one task per source,
//! and waits for all of them:
//!
//! ```text
//!                      ┌─► task(A): fetch ─► filter ─► store ─┐
//! catalog.sources() ───┼─► task(B): fetch ─► filter ─► store ─┼─► join barrier
//!                      └─► task(C): ...                       ─┘
//! ```
//!
//! Only a failing source list aborts a cycle.  A source whose fetch fails, or
//! whose sink write fails, is logged and dropped for this cycle; its siblings
//! are unaffected.  Items from one source are stored in feed order; there is
//! no ordering between sources.
//!
//! ## For contributors
//!
//! Nothing in here retries.  Retry or backoff belongs in an adapter or sink
//! wrapper.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::article::{Article, ArticleSink};
use crate::error::{FetchError, SourceError};
use crate::filter::KeywordFilter;
use crate::source::{AdapterFactory, SourceAdapter, SourceCatalog};

/// Fixed at construction; never changes while the fetcher runs.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Pause between the start of one cycle's tick and the next.
    pub fetch_interval: Duration,

    /// Items whose categories or lower-cased title match any of these are
    /// dropped.  See [`KeywordFilter`].
    pub filter_keywords: Vec<String>,

    /// Upper bound on sources processed at once.  `None` starts every source
    /// task immediately.
    pub max_concurrency: Option<NonZeroUsize>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            fetch_interval: Duration::from_secs(300),
            filter_keywords: Vec::new(),
            max_concurrency: None,
        }
    }
}

/// What one cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Sources returned by the catalog.
    pub sources: usize,
    /// Sources whose adapter failed (or whose task panicked).
    pub fetch_failures: usize,
    /// Sources cut short by a sink error.
    pub store_failures: usize,
    /// Articles handed to the sink successfully.
    pub stored: usize,
    /// Items dropped by the keyword filter.
    pub skipped: usize,
}

#[derive(Debug, Default)]
struct SourceOutcome {
    stored: usize,
    skipped: usize,
    error: Option<SourceError>,
}

impl CycleReport {
    fn absorb(&mut self, outcome: SourceOutcome) {
        self.stored += outcome.stored;
        self.skipped += outcome.skipped;
        match outcome.error {
            Some(SourceError::Fetch { .. }) => self.fetch_failures += 1,
            Some(SourceError::Store { .. }) => self.store_failures += 1,
            None => {}
        }
    }
}

pub struct Fetcher {
    catalog: Arc<dyn SourceCatalog>,
    sink: Arc<dyn ArticleSink>,
    factory: Arc<dyn AdapterFactory>,
    filter: Arc<KeywordFilter>,
    fetch_interval: Duration,
    limit: Option<Arc<Semaphore>>,
}

impl Fetcher {
    pub fn new(
        catalog: Arc<dyn SourceCatalog>,
        sink: Arc<dyn ArticleSink>,
        factory: Arc<dyn AdapterFactory>,
        config: FetcherConfig,
    ) -> Self {
        Self {
            catalog,
            sink,
            factory,
            filter: Arc::new(KeywordFilter::new(config.filter_keywords)),
            fetch_interval: config.fetch_interval,
            limit: config
                .max_concurrency
                .map(|n| Arc::new(Semaphore::new(n.get()))),
        }
    }

    /// Run cycles until cancelled or until a source list fails to load.
    ///
    /// The first cycle runs right away.  Ticks that fall due while a cycle is
    /// still running are delayed rather than fired back to back.  The return
    /// value is the reason the loop ended: [`FetchError::Catalog`] or
    /// [`FetchError::Cancelled`].  A listing that fails after the token has
    /// fired is reported as `Cancelled`.
    pub async fn start(&self, cancel: &CancellationToken) -> FetchError {
        info!(interval = ?self.fetch_interval, "fetcher started");

        if let Err(err) = self.fetch(cancel).await {
            return stop_reason(err, cancel);
        }

        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.fetch_interval, self.fetch_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("fetcher stopping");
                    return FetchError::Cancelled;
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.fetch(cancel).await {
                        return stop_reason(err, cancel);
                    }
                }
            }
        }
    }

    /// Run exactly one cycle and wait for every source task to finish.
    ///
    /// Fails only if the source list cannot be loaded.  Per-source failures
    /// are logged and counted in the returned [`CycleReport`].
    pub async fn fetch(&self, cancel: &CancellationToken) -> Result<CycleReport, FetchError> {
        let sources = self
            .catalog
            .sources(cancel)
            .await
            .map_err(FetchError::Catalog)?;

        let mut report = CycleReport {
            sources: sources.len(),
            ..CycleReport::default()
        };

        let mut tasks = JoinSet::new();
        for source in &sources {
            let adapter = self.factory.adapter_for(source);
            let sink = Arc::clone(&self.sink);
            let filter = Arc::clone(&self.filter);
            let limit = self.limit.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                // Never closed, so acquire cannot fail.
                let _permit = match limit {
                    Some(sem) => sem.acquire_owned().await.ok(),
                    None => None,
                };

                let outcome = run_source(adapter.as_ref(), sink.as_ref(), &filter, &cancel).await;
                if let Some(err) = &outcome.error {
                    warn!(source_id = adapter.id(), source = adapter.name(), error = %err, "source failed");
                }
                outcome
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.absorb(outcome),
                Err(err) => {
                    warn!(error = %err, "source task aborted");
                    report.fetch_failures += 1;
                }
            }
        }

        info!(
            sources = report.sources,
            stored = report.stored,
            skipped = report.skipped,
            fetch_failures = report.fetch_failures,
            store_failures = report.store_failures,
            "fetch cycle finished"
        );
        Ok(report)
    }
}

fn stop_reason(err: FetchError, cancel: &CancellationToken) -> FetchError {
    if cancel.is_cancelled() {
        info!(error = %err, "fetcher stopping");
        return FetchError::Cancelled;
    }
    err
}

async fn run_source(
    adapter: &dyn SourceAdapter,
    sink: &dyn ArticleSink,
    filter: &KeywordFilter,
    cancel: &CancellationToken,
) -> SourceOutcome {
    let mut outcome = SourceOutcome::default();

    let items = match adapter.fetch(cancel).await {
        Ok(items) => items,
        Err(source) => {
            outcome.error = Some(SourceError::Fetch {
                name: adapter.name().to_string(),
                source,
            });
            return outcome;
        }
    };

    for (index, item) in items.into_iter().enumerate() {
        if let Some(keyword) = filter.matching_keyword(&item) {
            debug!(source = adapter.name(), title = %item.title, keyword, "item filtered");
            outcome.skipped += 1;
            continue;
        }

        let article = Article::from_item(adapter.id(), item);
        if let Err(source) = sink.store(cancel, article).await {
            outcome.error = Some(SourceError::Store {
                name: adapter.name().to_string(),
                index,
                source,
            });
            return outcome;
        }
        outcome.stored += 1;
    }

    outcome
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
