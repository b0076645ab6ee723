//! Item extraction from arbitrary HTML pages.
//!
//! Sources in scrape mode name three selectors: title, link and an optional
//! description. Each selector yields an independent, ordered stream of
//! matches, and items are formed by zipping those streams by position.
//!
//! # Architecture
//!
//! ```text
//! HTML → extract (per-role slots) → correlate (zip by index) → Item
//! ```
//!
//! Pairing is purely positional. A page that interleaves unrelated titles or
//! links with the real ones will misalign silently; the tiered
//! [`SelectorError`] diagnostics are the only guard.

mod extract;
mod text;

pub use extract::{PageExtraction, SelectorScraper};
pub use text::{collapse_whitespace, strip_html};

use thiserror::Error;

use crate::app::Result;
use crate::domain::{Item, ScrapeSelectors};
use crate::fetcher::{FetchKind, Fetcher};

/// Why a scrape produced no items.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("Invalid selector \"{selector}\": {reason}")]
    Invalid { selector: String, reason: String },

    #[error(
        "Selectors matched nothing: title selector \"{title_selector}\" found {title_matches} \
         element(s) and none had text, link selector \"{link_selector}\" found no links. \
         Please verify your selectors are correct."
    )]
    NothingMatched {
        title_selector: String,
        title_matches: usize,
        link_selector: String,
    },

    #[error(
        "No titles found with selector \"{selector}\": {matched} element(s) matched but all were empty. \
         Check that the title selector matches elements with text content."
    )]
    NoTitles { selector: String, matched: usize },

    #[error(
        "No links found with selector \"{selector}\". \
         Check that it matches <a> tags or other elements with an href attribute."
    )]
    NoLinks { selector: String },

    #[error(
        "Found {titles} title(s) and {links} link(s) but could not pair items; \
         selectors may be out of sync. Try more specific selectors."
    )]
    Unpaired { titles: usize, links: usize },
}

pub const PREVIEW_SOURCE_ID: &str = "preview";
pub const DEFAULT_PREVIEW_LIMIT: usize = 3;

/// Fetch `url` and return the first `limit` items the selectors would produce.
pub async fn preview(
    fetcher: &dyn Fetcher,
    url: &str,
    selectors: &ScrapeSelectors,
    limit: usize,
) -> Result<Vec<Item>> {
    selectors.validate()?;
    let html = fetcher.fetch(url, FetchKind::Page).await?;
    let mut items = SelectorScraper::new().scrape(PREVIEW_SOURCE_ID, &html, url, selectors)?;
    items.truncate(limit);
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticFetcher;

    #[tokio::test]
    async fn test_preview_limits_items() {
        let html = (1..=5)
            .map(|i| format!("<h2>Post {i}</h2><a href=\"/p/{i}\">read</a>"))
            .collect::<String>();
        let fetcher = StaticFetcher::new().with_body("https://ex.com/blog", &html);

        let items = preview(
            &fetcher,
            "https://ex.com/blog",
            &ScrapeSelectors::new("h2", "a"),
            DEFAULT_PREVIEW_LIMIT,
        )
        .await
        .unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Post 1");
        assert_eq!(items[2].link, "https://ex.com/p/3");
        assert!(items[0].id.starts_with("preview:0:"));
    }

    #[tokio::test]
    async fn test_preview_requires_selectors() {
        let fetcher = StaticFetcher::new();
        let result = preview(
            &fetcher,
            "https://ex.com/blog",
            &ScrapeSelectors::new("h2", ""),
            3,
        )
        .await;
        assert!(matches!(result, Err(crate::app::FeedwatchError::Config(_))));
    }
}
