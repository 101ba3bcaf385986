//! Error taxonomy for the fetcher.
//!
//! Only [`FetchError`] ever reaches a caller.  [`SourceError`] describes a
//! failure confined to one source; the fetcher logs it and carries on.

use thiserror::Error;

/// Cycle-level failure returned by [`Fetcher::fetch`](crate::Fetcher::fetch)
/// and [`Fetcher::start`](crate::Fetcher::start).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Loading the source list failed; nothing was fetched.
    #[error("failed to load sources: {0:#}")]
    Catalog(#[source] anyhow::Error),

    /// The cancellation token fired.
    #[error("fetcher cancelled")]
    Cancelled,
}

/// Failure of a single source task.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The adapter could not fetch or parse the feed.
    #[error("failed to fetch items for {name}: {source:#}")]
    Fetch {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The sink rejected an article; the rest of this source's items were
    /// abandoned for the cycle.
    #[error("failed to store item {index} from {name}: {source:#}")]
    Store {
        name: String,
        index: usize,
        #[source]
        source: anyhow::Error,
    },
}
