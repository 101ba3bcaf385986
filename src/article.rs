//! Normalized articles and the sink that persists them.
//!
//! An [`Article`] is what survives filtering: source identity plus the item's
//! fields, with the publish time converted to UTC.  Once handed to an
//! [`ArticleSink`] the fetcher forgets about it.
//!
//! Uniqueness is the sink's job.  Both sinks shipped here key on
//! `(source_id, link)` so polling the same feed twice stores each item once.
//! [`JsonLinesSink::open`] reads those keys back from an existing output file,
//! so a restart does not append the same articles again.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::source::Item;

/// A filtered, persistence-ready item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub source_id: i64,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
}

impl Article {
    /// Build an article from a raw item, normalizing its timestamp to UTC.
    pub fn from_item(source_id: i64, item: Item) -> Self {
        Self {
            source_id,
            title: item.title,
            link: item.link,
            summary: item.summary,
            published_at: item.published.with_timezone(&Utc),
        }
    }

    fn key(&self) -> (i64, String) {
        (self.source_id, self.link.clone())
    }
}

/// Persists one article at a time.
#[async_trait]
pub trait ArticleSink: Send + Sync {
    /// Store `article`.  Storing an article that is already present must not
    /// fail; an error means the write itself went wrong.
    async fn store(&self, cancel: &CancellationToken, article: Article) -> Result<()>;
}

// A poisoned lock only means another store panicked mid-push; the data is
// still a valid list.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// In-memory sink
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Stored {
    articles: Vec<Article>,
    seen: HashSet<(i64, String)>,
}

/// Keeps stored articles in memory, in arrival order.
#[derive(Default)]
pub struct MemorySink {
    inner: Mutex<Stored>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored so far.
    pub fn articles(&self) -> Vec<Article> {
        lock(&self.inner).articles.clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ArticleSink for MemorySink {
    async fn store(&self, _cancel: &CancellationToken, article: Article) -> Result<()> {
        let mut stored = lock(&self.inner);
        if stored.seen.insert(article.key()) {
            stored.articles.push(article);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON-lines sink
// ---------------------------------------------------------------------------

struct Lines<W> {
    out: W,
    seen: HashSet<(i64, String)>,
}

/// Writes each new article as one JSON object per line.
///
/// The key of every article written (or found on [`open`](Self::open)) is
/// held in memory for the life of the sink, so memory grows with the number
/// of distinct articles in the output.
pub struct JsonLinesSink<W> {
    inner: Mutex<Lines<W>>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self::with_seen(out, HashSet::new())
    }

    fn with_seen(out: W, seen: HashSet<(i64, String)>) -> Self {
        Self {
            inner: Mutex::new(Lines { out, seen }),
        }
    }

    /// Consume the sink and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .out
    }
}

impl JsonLinesSink<File> {
    /// Open `path` for appending, creating it if needed.
    ///
    /// Articles already in the file count as stored.  Lines that do not parse
    /// as an [`Article`] are logged and ignored.  A torn final line is closed
    /// off before the first new write.
    pub fn open(path: &Path) -> Result<Self> {
        let existing = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
            Err(err) => {
                return Err(err).with_context(|| format!("reading output file {}", path.display()))
            }
        };

        let mut seen = HashSet::new();
        for (n, line) in existing.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Article>(line) {
                Ok(article) => {
                    seen.insert(article.key());
                }
                Err(err) => {
                    warn!(path = %path.display(), line = n + 1, error = %err, "ignoring unreadable output line")
                }
            }
        }
        debug!(path = %path.display(), known = seen.len(), "output file opened");

        let mut out = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening output file {}", path.display()))?;
        if !existing.is_empty() && !existing.ends_with('\n') {
            out.write_all(b"\n")?;
        }

        Ok(Self::with_seen(out, seen))
    }
}

#[async_trait]
impl<W: Write + Send> ArticleSink for JsonLinesSink<W> {
    async fn store(&self, _cancel: &CancellationToken, article: Article) -> Result<()> {
        let mut lines = lock(&self.inner);
        if lines.seen.contains(&article.key()) {
            return Ok(());
        }

        serde_json::to_writer(&mut lines.out, &article)?;
        lines.out.write_all(b"\n")?;
        lines.out.flush()?;
        // Only remember the key once the line is actually written.
        lines.seen.insert(article.key());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
