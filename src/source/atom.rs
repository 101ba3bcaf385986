//! Atom feed source implementation.

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{get_body, Item, SourceAdapter, SourceDescriptor};

/// An Atom 1.0 feed fetched over HTTP and parsed with [`atom_syndication`].
pub struct AtomSource {
    id: i64,
    name: String,
    url: String,
    client: reqwest::Client,
}

impl AtomSource {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        url: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            url: url.into(),
            client,
        }
    }

    pub fn from_descriptor(source: &SourceDescriptor, client: reqwest::Client) -> Self {
        Self::new(source.id, &source.name, &source.feed_url, client)
    }

    /// Parse an already-fetched [`atom_syndication::Feed`] into [`Item`]s.
    ///
    /// `<updated>` is mandatory in Atom, so it stands in for a missing
    /// `<published>`.
    pub fn parse_feed(feed: &atom_syndication::Feed) -> Vec<Item> {
        feed.entries()
            .iter()
            .map(|entry| {
                // rel="alternate" is the article itself; otherwise take the first link.
                let link = entry
                    .links()
                    .iter()
                    .find(|l| l.rel() == "alternate")
                    .or_else(|| entry.links().first())
                    .map(|l| l.href().to_string())
                    .unwrap_or_else(|| entry.id().to_string());

                Item {
                    title: entry.title().as_str().to_string(),
                    link,
                    summary: entry
                        .summary()
                        .map(|s| s.as_str().to_string())
                        .unwrap_or_default(),
                    categories: entry
                        .categories()
                        .iter()
                        .map(|c| c.term().to_string())
                        .collect(),
                    published: *entry.published().unwrap_or(entry.updated()),
                }
            })
            .collect()
    }
}

#[async_trait]
impl SourceAdapter for AtomSource {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, cancel: &CancellationToken) -> Result<Vec<Item>> {
        let body = get_body(&self.client, &self.url, cancel).await?;
        let feed = atom_syndication::Feed::read_from(body.as_slice())?;
        Ok(Self::parse_feed(&feed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example</title>
  <id>urn:example:feed</id>
  <updated>2024-01-02T00:00:00Z</updated>
  <entry>
    <title>Go 1.22 released</title>
    <id>urn:example:1</id>
    <link rel="alternate" href="https://example.com/go-1.22"/>
    <updated>2024-01-01T12:00:00+02:00</updated>
    <published>2024-01-01T10:00:00+02:00</published>
    <summary>Release notes</summary>
    <category term="golang"/>
  </entry>
  <entry>
    <title>Only updated</title>
    <id>urn:example:2</id>
    <updated>2024-01-01T09:00:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn parse_feed_extracts_entries() {
        let feed = atom_syndication::Feed::read_from(FEED.as_bytes()).unwrap();
        let items = AtomSource::parse_feed(&feed);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Go 1.22 released");
        assert_eq!(items[0].link, "https://example.com/go-1.22");
        assert_eq!(items[0].summary, "Release notes");
        assert_eq!(items[0].categories, vec!["golang"]);
        assert_eq!(items[0].published.to_rfc3339(), "2024-01-01T10:00:00+02:00");
    }

    #[test]
    fn missing_published_and_link_fall_back() {
        let feed = atom_syndication::Feed::read_from(FEED.as_bytes()).unwrap();
        let items = AtomSource::parse_feed(&feed);

        assert_eq!(items[1].link, "urn:example:2");
        assert_eq!(items[1].published.to_rfc3339(), "2024-01-01T09:00:00+00:00");
        assert!(items[1].summary.is_empty());
    }
}
