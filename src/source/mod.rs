//! Source abstraction layer.
//!
//! This module defines the two collaborator traits the fetcher talks to on the
//! input side, [`SourceCatalog`] and [`SourceAdapter`], plus the
//! [`AdapterFactory`] that turns a catalog entry into an adapter.  Concrete
//! adapters live in sub-modules ([`rss`], [`atom`]).
//!
//! ## For contributors: adding a new source kind
//!
//! 1. Create a new file in this directory (e.g. `json_feed.rs`).
//! 2. Define a struct and implement [`SourceAdapter`] for it.
//! 3. Add a variant to [`SourceKind`] and a match arm in
//!    [`HttpAdapterFactory::adapter_for`].
//!
//! That's it: the fan-out, filtering and persistence are all source-agnostic.

mod atom;
mod catalog;
mod item;
mod rss;

pub use atom::AtomSource;
pub use catalog::StaticCatalog;
pub use item::{Item, SourceDescriptor, SourceKind};
pub use rss::RssSource;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Fetch capability for one configured source.
///
/// The fetcher builds one adapter per source per cycle and calls
/// [`fetch()`](SourceAdapter::fetch) on a worker task, so implementations must
/// be `Send + Sync`.
///
/// ```ignore
/// struct MySource { id: i64, name: String }
///
/// #[async_trait]
/// impl SourceAdapter for MySource {
///     fn id(&self) -> i64 { self.id }
///     fn name(&self) -> &str { &self.name }
///
///     async fn fetch(&self, cancel: &CancellationToken) -> Result<Vec<Item>> {
///         // Perform HTTP / IO, then convert into Item values.
///         todo!()
///     }
/// }
/// ```
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Identity of the underlying source descriptor.
    fn id(&self) -> i64;

    /// Human-readable label used in log lines.
    fn name(&self) -> &str;

    /// Fetch the current items, in feed order.
    ///
    /// Implementations should give up promptly once `cancel` fires; the
    /// fetcher never aborts a worker on its own.
    async fn fetch(&self, cancel: &CancellationToken) -> Result<Vec<Item>>;
}

/// The current set of configured sources.
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// Load every source that should be polled this cycle.
    ///
    /// An error here aborts the whole cycle.
    async fn sources(&self, cancel: &CancellationToken) -> Result<Vec<SourceDescriptor>>;
}

/// Builds the adapter for a catalog entry.
///
/// Closures with the right signature implement this trait, which keeps tests
/// free of boilerplate.
pub trait AdapterFactory: Send + Sync {
    fn adapter_for(&self, source: &SourceDescriptor) -> Box<dyn SourceAdapter>;
}

impl<F> AdapterFactory for F
where
    F: Fn(&SourceDescriptor) -> Box<dyn SourceAdapter> + Send + Sync,
{
    fn adapter_for(&self, source: &SourceDescriptor) -> Box<dyn SourceAdapter> {
        self(source)
    }
}

/// Default factory: dispatches on [`SourceKind`] and shares one HTTP client
/// across every adapter it builds.
#[derive(Clone)]
pub struct HttpAdapterFactory {
    client: reqwest::Client,
}

impl HttpAdapterFactory {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a client with the given request timeout and user agent.
    pub fn with_timeout(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self::new(client))
    }
}

impl AdapterFactory for HttpAdapterFactory {
    fn adapter_for(&self, source: &SourceDescriptor) -> Box<dyn SourceAdapter> {
        match source.kind {
            SourceKind::Rss => Box::new(RssSource::from_descriptor(source, self.client.clone())),
            SourceKind::Atom => Box::new(AtomSource::from_descriptor(source, self.client.clone())),
        }
    }
}

/// GET `url` and return the body, treating non-2xx as an error.
///
/// Races the request against `cancel` so a shutdown does not wait out the
/// client timeout.
pub(crate) async fn get_body(
    client: &reqwest::Client,
    url: &str,
    cancel: &CancellationToken,
) -> Result<Vec<u8>> {
    let request = async {
        let response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("{url} returned HTTP {}", status.as_u16());
        }
        Ok::<_, anyhow::Error>(response.bytes().await?.to_vec())
    };

    tokio::select! {
        _ = cancel.cancelled() => anyhow::bail!("fetch of {url} cancelled"),
        body = request => body,
    }
}
