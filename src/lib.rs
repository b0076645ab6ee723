//! # feedwatch
//!
//! Polls RSS/Atom feeds and arbitrary HTML pages on a schedule and emails a
//! digest of items it hasn't delivered before, one digest per source group.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → {Normalizer | Scraper} → SeenSet filter → group → Notifier → SeenSet commit → Registry
//! ```
//!
//! - [`normalizer`]: RSS/Atom parsing into [`Item`](domain::Item)s
//! - [`scraper`]: positional selector-pair extraction from HTML pages
//! - [`seen`]: thirty-day memory of delivered items
//! - [`orchestrator`]: the per-run state machine
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a feed to the "tech" digest
//! feedwatch add https://blog.rust-lang.org/feed.xml --group tech
//!
//! # Add a page without a feed
//! feedwatch add https://example.com/news --scrape \
//!     --title-selector "h2.title" --link-selector "a.read-more"
//!
//! # Check once, or keep checking
//! feedwatch run
//! feedwatch daemon --interval 5m
//! ```

/// Application context and error handling.
///
/// [`AppContext`](app::AppContext) wires the store, fetcher, notifier and
/// orchestrator together from a [`Config`](config::Config).
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// TOML configuration at `~/.config/feedwatch/config.toml`.
pub mod config;

/// Periodic runs until Ctrl-C or SIGTERM.
pub mod daemon;

/// Core domain models.
///
/// - [`Source`](domain::Source): a configured feed or scraped page
/// - [`Item`](domain::Item): one normalized entry
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): async trait
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Feed parsing and normalization.
pub mod normalizer;

/// Digest rendering and delivery.
pub mod notifier;

/// Run orchestration and the cross-run lock.
pub mod orchestrator;

/// Source list persistence and CRUD.
pub mod registry;

/// Selector-pair scraping of HTML pages.
pub mod scraper;

/// Delivered-item markers with expiry.
pub mod seen;

/// Key/value persistence.
///
/// - [`KvStore`](store::KvStore): trait with per-key TTL
/// - [`SqliteKv`](store::SqliteKv): SQLite implementation
/// - [`MemoryKv`](store::MemoryKv): in-process implementation
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
