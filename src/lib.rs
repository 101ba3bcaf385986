//! feedfetch: polls a dynamic set of feed sources and persists new articles.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌───────────────┐ descriptors ┌──────────────┐ Article ┌─────────────┐
//! │ SourceCatalog │ ──────────► │  fetcher.rs  │ ──────► │ ArticleSink │
//! └───────────────┘             │ loop, fan-out│         └─────────────┘
//!                               │ filter, UTC  │
//!                               └──────────────┘
//!                                  ▲ Item
//!                                  │ (one task per source)
//!                               ┌──────────────┐
//!                               │ SourceAdapter│  rss.rs / atom.rs
//!                               └──────────────┘
//! ```
//!
//! * **`source/`**: [`SourceAdapter`], [`SourceCatalog`] and
//!   [`AdapterFactory`], plus the RSS and Atom adapters and a static catalog.
//! * **`fetcher`**: the interval loop, per-cycle fan-out and per-item
//!   normalize → filter → store pipeline.
//! * **`filter`**: the keyword policy deciding which items are dropped.
//! * **`article`**: the normalized [`Article`] and the sinks that store it.
//! * **`config`**: TOML configuration for the binary.
//! * **`error`**: cycle-level and per-source error types.

pub mod article;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod source;

pub use article::{Article, ArticleSink, JsonLinesSink, MemorySink};
pub use config::Config;
pub use error::{FetchError, SourceError};
pub use fetcher::{CycleReport, Fetcher, FetcherConfig};
pub use filter::KeywordFilter;
pub use source::{
    AdapterFactory, HttpAdapterFactory, Item, SourceAdapter, SourceCatalog, SourceDescriptor,
    SourceKind, StaticCatalog,
};
