use ::scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::app::Result;
use crate::domain::{hash_identifier, Item, ScrapeSelectors};
use crate::scraper::text::collapse_whitespace;
use crate::scraper::SelectorError;

/// Raw per-role sequences gathered from one pass over a page.
///
/// Title and description slots keep their match ordinal; a slot that was
/// empty after trimming is `None` so later slots keep their position.
#[derive(Debug, Default)]
pub struct PageExtraction {
    pub titles: Vec<Option<String>>,
    pub links: Vec<String>,
    pub descriptions: Vec<Option<String>>,
}

impl PageExtraction {
    pub fn title_count(&self) -> usize {
        self.titles.iter().flatten().count()
    }
}

fn parse_selector(selector: &str) -> std::result::Result<Selector, SelectorError> {
    Selector::parse(selector.trim()).map_err(|e| SelectorError::Invalid {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Text content of `el`. The parser has already decoded entities, so the
/// only cleanup left is whitespace.
fn text_slot(el: ElementRef<'_>) -> Option<String> {
    let text: String = el.text().collect();
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Scrapes HTML pages into items by pairing title and link matches by position.
#[derive(Clone, Default)]
pub struct SelectorScraper;

impl SelectorScraper {
    pub fn new() -> Self {
        Self
    }

    /// Collect title, link and description matches from `html`.
    ///
    /// Links are resolved against `base`; a link match without a usable
    /// `href` is skipped.
    pub fn extract(
        &self,
        html: &str,
        base: &Url,
        selectors: &ScrapeSelectors,
    ) -> Result<PageExtraction> {
        selectors.validate()?;

        let title_sel = parse_selector(&selectors.title_selector)?;
        let link_sel = parse_selector(&selectors.link_selector)?;
        let desc_sel = selectors.description().map(parse_selector).transpose()?;

        let document = Html::parse_document(html);
        let mut extraction = PageExtraction {
            titles: document.select(&title_sel).map(text_slot).collect(),
            ..Default::default()
        };

        for el in document.select(&link_sel) {
            let Some(href) = el.value().attr("href").map(str::trim) else {
                continue;
            };
            match base.join(href) {
                Ok(url) => extraction.links.push(url.to_string()),
                Err(e) => debug!(href, error = %e, "Skipping unresolvable link"),
            }
        }

        if let Some(desc_sel) = desc_sel {
            extraction.descriptions = document.select(&desc_sel).map(text_slot).collect();
        }

        Ok(extraction)
    }

    /// Pair extracted sequences into items by ordinal position.
    ///
    /// Index `i` yields an item only when both a title and a link exist at
    /// `i`; a missing description just leaves the summary empty.
    pub fn correlate(
        &self,
        source_id: &str,
        extraction: &PageExtraction,
        selectors: &ScrapeSelectors,
    ) -> std::result::Result<Vec<Item>, SelectorError> {
        let title_count = extraction.title_count();
        let link_count = extraction.links.len();

        if title_count == 0 && link_count == 0 {
            return Err(SelectorError::NothingMatched {
                title_selector: selectors.title_selector.clone(),
                title_matches: extraction.titles.len(),
                link_selector: selectors.link_selector.clone(),
            });
        }
        if title_count == 0 {
            return Err(SelectorError::NoTitles {
                selector: selectors.title_selector.clone(),
                matched: extraction.titles.len(),
            });
        }
        if link_count == 0 {
            return Err(SelectorError::NoLinks {
                selector: selectors.link_selector.clone(),
            });
        }

        let slots = extraction.titles.len().max(link_count);
        let mut items = Vec::new();

        for i in 0..slots {
            let (Some(Some(raw_title)), Some(link)) =
                (extraction.titles.get(i), extraction.links.get(i))
            else {
                continue;
            };
            let title = collapse_whitespace(raw_title);
            if title.is_empty() {
                continue;
            }
            let summary = extraction
                .descriptions
                .get(i)
                .and_then(|d| d.as_deref())
                .map(collapse_whitespace)
                .filter(|s| !s.is_empty());

            items.push(Item {
                id: format!("{}:{}:{}", source_id, i, hash_identifier(link)),
                title,
                link: link.clone(),
                summary,
                published: None,
            });
        }

        if items.is_empty() {
            return Err(SelectorError::Unpaired {
                titles: title_count,
                links: link_count,
            });
        }

        Ok(items)
    }

    /// Extract and correlate in one step.
    pub fn scrape(
        &self,
        source_id: &str,
        html: &str,
        base_url: &str,
        selectors: &ScrapeSelectors,
    ) -> Result<Vec<Item>> {
        let base = Url::parse(base_url)?;
        let extraction = self.extract(html, &base, selectors)?;
        let items = self.correlate(source_id, &extraction, selectors)?;
        debug!(
            source = source_id,
            titles = extraction.title_count(),
            links = extraction.links.len(),
            items = items.len(),
            "Scraped page"
        );
        Ok(items)
    }
}
