pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

pub const FEED_ACCEPT: &str =
    "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.8";

/// What is being fetched; decides the request headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// RSS/Atom document
    Feed,
    /// HTML page for selector scraping
    Page,
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and return the body as text. Non-2xx responses are errors.
    async fn fetch(&self, url: &str, kind: FetchKind) -> Result<String>;
}
