//! HTTP adapters and a full cycle against a local mock server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};
use feedfetch::source::{AtomSource, RssSource};
use feedfetch::{
    AdapterFactory, Fetcher, FetcherConfig, HttpAdapterFactory, MemorySink, SourceAdapter,
    SourceDescriptor, SourceKind, StaticCatalog,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RSS_A: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>A</title>
    <item>
      <title>Go 1.22 released</title>
      <link>https://a.example/go-1.22</link>
      <pubDate>Mon, 01 Jan 2024 10:00:00 +0200</pubDate>
    </item>
  </channel>
</rss>"#;

const RSS_B: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>B</title>
    <item>
      <title>breaking news</title>
      <link>https://b.example/breaking</link>
      <category>politics</category>
      <pubDate>Mon, 01 Jan 2024 09:00:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#;

const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>C</title>
  <id>urn:c</id>
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <title>Atom entry</title>
    <id>urn:c:1</id>
    <link href="https://c.example/1"/>
    <updated>2024-01-01T00:00:00-05:00</updated>
  </entry>
</feed>"#;

async fn serve(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn descriptor(id: i64, name: &str, url: String, kind: SourceKind) -> SourceDescriptor {
    SourceDescriptor {
        id,
        name: name.to_string(),
        feed_url: url,
        kind,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn rss_source_fetches_and_parses() {
    let server = MockServer::start().await;
    serve(&server, "/a.xml", RSS_A).await;

    let src = RssSource::new(1, "A", format!("{}/a.xml", server.uri()), reqwest::Client::new());
    let items = src.fetch(&CancellationToken::new()).await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Go 1.22 released");
    assert_eq!(items[0].link, "https://a.example/go-1.22");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let src = RssSource::new(1, "gone", format!("{}/gone.xml", server.uri()), reqwest::Client::new());
    let err = src.fetch(&CancellationToken::new()).await.unwrap_err();

    assert!(err.to_string().contains("404"), "unexpected error: {err}");
}

#[tokio::test]
async fn malformed_body_is_an_error() {
    let server = MockServer::start().await;
    serve(&server, "/junk.xml", "this is not xml").await;

    let src = AtomSource::new(1, "junk", format!("{}/junk.xml", server.uri()), reqwest::Client::new());
    assert!(src.fetch(&CancellationToken::new()).await.is_err());
}

#[tokio::test]
async fn cancellation_interrupts_a_slow_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(RSS_A)
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let src = RssSource::new(1, "slow", format!("{}/slow.xml", server.uri()), reqwest::Client::new());
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = src.fetch(&cancel).await.unwrap_err();

    assert!(err.to_string().contains("cancelled"));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn factory_builds_adapter_matching_source_kind() {
    let server = MockServer::start().await;
    serve(&server, "/c.atom", ATOM).await;

    let factory = HttpAdapterFactory::new(reqwest::Client::new());
    let adapter = factory.adapter_for(&descriptor(
        9,
        "C",
        format!("{}/c.atom", server.uri()),
        SourceKind::Atom,
    ));
    let items = adapter.fetch(&CancellationToken::new()).await.unwrap();

    assert_eq!(adapter.id(), 9);
    assert_eq!(items[0].link, "https://c.example/1");
    assert_eq!(items[0].published.offset().local_minus_utc(), -5 * 3600);
}

#[tokio::test]
async fn full_cycle_stores_only_unfiltered_items_in_utc() {
    let server = MockServer::start().await;
    serve(&server, "/a.xml", RSS_A).await;
    serve(&server, "/b.xml", RSS_B).await;

    let catalog = Arc::new(StaticCatalog::new(vec![
        descriptor(1, "A", format!("{}/a.xml", server.uri()), SourceKind::Rss),
        descriptor(2, "B", format!("{}/b.xml", server.uri()), SourceKind::Rss),
        // Nothing is mounted here, so this source fails on its own.
        descriptor(3, "missing", format!("{}/missing.xml", server.uri()), SourceKind::Rss),
    ]));
    let sink = Arc::new(MemorySink::new());
    let fetcher = Fetcher::new(
        catalog,
        sink.clone(),
        Arc::new(HttpAdapterFactory::new(reqwest::Client::new())),
        FetcherConfig {
            filter_keywords: vec!["politics".to_string()],
            ..FetcherConfig::default()
        },
    );

    let report = fetcher.fetch(&CancellationToken::new()).await.unwrap();

    let stored = sink.articles();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].source_id, 1);
    assert_eq!(
        stored[0].published_at,
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
    );
    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.skipped, 1);

    // A second cycle sees the same items; the sink keeps one copy.
    fetcher.fetch(&CancellationToken::new()).await.unwrap();
    assert_eq!(sink.len(), 1);
}
