//! RSS feed source implementation.
//!
//! This module shows how to implement [`SourceAdapter`] for a concrete feed
//! format.  Use it as a template when adding support for another format; the
//! Atom adapter next door follows the same layout.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use tokio_util::sync::CancellationToken;

use super::{get_body, Item, SourceAdapter, SourceDescriptor};

/// An RSS 2.0 feed fetched over HTTP and parsed with the [`rss`] crate.
pub struct RssSource {
    id: i64,
    name: String,
    url: String,
    client: reqwest::Client,
}

impl RssSource {
    /// Create a new RSS source.
    ///
    /// # Arguments
    ///
    /// * `id`: identity copied onto every article from this feed.
    /// * `name`: label shown in log lines.
    /// * `url`: full URL of the RSS document.
    /// * `client`: shared HTTP client (timeouts and user agent live there).
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

    /// Parse an already-fetched [`rss::Channel`] into [`Item`]s.
    ///
    /// This is a pure function (no I/O) so that tests can exercise the
    /// parsing logic without hitting the network.  Items whose `<pubDate>` is
    /// missing or malformed are stamped with `fetched_at`.
    pub fn parse_channel(channel: &rss::Channel, fetched_at: DateTime<FixedOffset>) -> Vec<Item> {
        channel
            .items()
            .iter()
            .map(|item| {
                // Prefer <link>, fall back to <guid>, then empty string.
                let link = item
                    .link()
                    .map(String::from)
                    .or_else(|| item.guid().map(|g| g.value().to_string()))
                    .unwrap_or_default();

                // Keep the declared offset; the fetcher converts to UTC.
                let published = item
                    .pub_date()
                    .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
                    .unwrap_or(fetched_at);

                Item {
                    title: item.title().unwrap_or("(untitled)").to_string(),
                    link,
                    summary: item.description().unwrap_or_default().to_string(),
                    categories: item
                        .categories()
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect(),
                    published,
                }
            })
            .collect()
    }
}

#[async_trait]
impl SourceAdapter for RssSource {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, cancel: &CancellationToken) -> Result<Vec<Item>> {
        let body = get_body(&self.client, &self.url, cancel).await?;
        let channel = rss::Channel::read_from(body.as_slice())?;
        Ok(Self::parse_channel(&channel, Utc::now().fixed_offset()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fetched_at() -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap().fixed_offset()
    }

    #[test]
    fn parse_channel_extracts_items() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <item>
      <title>First Post</title>
      <link>https://example.com/1</link>
      <guid>guid-1</guid>
      <pubDate>Mon, 01 Jan 2024 10:00:00 +0200</pubDate>
      <description>First description</description>
      <category>tech</category>
      <category>Go</category>
    </item>
    <item>
      <title>Second Post</title>
      <link>https://example.com/2</link>
      <guid>guid-2</guid>
      <pubDate>Tue, 02 Jan 2024 12:00:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#;

        let channel = rss::Channel::read_from(xml.as_bytes()).unwrap();
        let items = RssSource::parse_channel(&channel, fetched_at());

        assert_eq!(items.len(), 2);

        assert_eq!(items[0].title, "First Post");
        assert_eq!(items[0].link, "https://example.com/1");
        assert_eq!(items[0].summary, "First description");
        assert_eq!(items[0].categories, vec!["tech", "Go"]);
        assert_eq!(items[0].published.offset().local_minus_utc(), 2 * 3600);

        assert_eq!(items[1].title, "Second Post");
        assert!(items[1].summary.is_empty());
        assert!(items[1].categories.is_empty());
    }

    #[test]
    fn falls_back_to_guid_when_no_link() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test</title>
    <item>
      <title>No link</title>
      <guid>https://example.com/by-guid</guid>
    </item>
  </channel>
</rss>"#;

        let channel = rss::Channel::read_from(xml.as_bytes()).unwrap();
        let items = RssSource::parse_channel(&channel, fetched_at());

        assert_eq!(items[0].link, "https://example.com/by-guid");
    }

    #[test]
    fn handles_missing_title() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test</title>
    <item>
      <guid>g1</guid>
    </item>
  </channel>
</rss>"#;

        let channel = rss::Channel::read_from(xml.as_bytes()).unwrap();
        let items = RssSource::parse_channel(&channel, fetched_at());

        assert_eq!(items[0].title, "(untitled)");
    }

    #[test]
    fn invalid_date_uses_fetch_time() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test</title>
    <item>
      <guid>g1</guid>
      <title>Bad Date</title>
      <pubDate>not-a-real-date</pubDate>
    </item>
  </channel>
</rss>"#;

        let channel = rss::Channel::read_from(xml.as_bytes()).unwrap();
        let items = RssSource::parse_channel(&channel, fetched_at());

        assert_eq!(items[0].published, fetched_at());
    }

    #[test]
    fn identity_comes_from_descriptor() {
        let desc = SourceDescriptor {
            id: 42,
            name: "My Feed".into(),
            feed_url: "http://example.com/feed".into(),
            kind: crate::source::SourceKind::Rss,
            created_at: Utc::now(),
        };
        let src = RssSource::from_descriptor(&desc, reqwest::Client::new());
        assert_eq!(src.id(), 42);
        assert_eq!(src.name(), "My Feed");
    }
}
