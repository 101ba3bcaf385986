//! Source descriptors and the raw item type produced by every adapter.
//!
//! `Item` is what a [`SourceAdapter`](super::SourceAdapter) hands back from a
//! fetch.  It is deliberately close to the wire: the publish timestamp keeps
//! whatever offset the feed declared, and nothing has been filtered yet.  The
//! fetcher turns surviving items into [`Article`](crate::article::Article)s.
//!
//! ## For contributors
//!
//! If you are adding a new source kind you do **not** need to modify this file
//! unless your format carries fields the fetcher should see.  Add a variant to
//! [`SourceKind`] and construct `Item` values in your adapter's `fetch()`.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Wire format of a configured source.
///
/// The adapter factory matches on this tag to decide which adapter to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// RSS 2.0 (the default when a config entry omits `kind`).
    #[default]
    Rss,
    /// Atom 1.0.
    Atom,
}

/// One configured external feed.
///
/// Owned by the [`SourceCatalog`](super::SourceCatalog).  The fetcher only
/// holds a snapshot of the list for the duration of a single cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Stable identity, copied onto every article from this source.
    pub id: i64,

    /// Human-readable name used in log lines.
    pub name: String,

    /// URL of the feed document.
    pub feed_url: String,

    /// Which adapter understands this feed.
    #[serde(default)]
    pub kind: SourceKind,

    /// When the source was registered.  Config-file sources get the load time.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// A single raw entry returned by a source fetch, before filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Headline.  Lower-cased for keyword matching, stored verbatim.
    pub title: String,

    /// URL of the full content.
    pub link: String,

    /// Short description, empty when the feed provides none.
    pub summary: String,

    /// Category labels exactly as the feed spelled them.
    pub categories: Vec<String>,

    /// Publication timestamp in the feed's own offset.
    pub published: DateTime<FixedOffset>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
