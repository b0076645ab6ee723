//! The configured source list, stored as one JSON array under `feeds:list`.
//!
//! Every mutation is a read-modify-write of the whole list.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::app::{FeedwatchError, Result};
use crate::domain::source::{clamp_interval, non_blank};
use crate::domain::{
    ScrapeSelectors, Source, SourceInput, SourceMode, SourcePatch, DEFAULT_INTERVAL_MINUTES,
};
use crate::store::KvStore;

pub const FEEDS_KEY: &str = "feeds:list";

#[derive(Clone)]
pub struct SourceRegistry {
    kv: Arc<dyn KvStore>,
}

impl SourceRegistry {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Read all sources. A missing key or a non-array value reads as empty;
    /// malformed JSON is an error so a later save can't wipe the list.
    pub async fn load(&self) -> Result<Vec<Source>> {
        let Some(raw) = self.kv.get(FEEDS_KEY).await? else {
            return Ok(Vec::new());
        };

        let value: serde_json::Value = serde_json::from_str(&raw)?;
        if !value.is_array() {
            warn!(key = FEEDS_KEY, "Stored source list is not an array, treating as empty");
            return Ok(Vec::new());
        }

        Ok(serde_json::from_value(value)?)
    }

    pub async fn save(&self, sources: &[Source]) -> Result<()> {
        let raw = serde_json::to_string(sources)?;
        self.kv.put(FEEDS_KEY, &raw, None).await
    }

    pub async fn list(&self) -> Result<Vec<Source>> {
        self.load().await
    }

    pub async fn get(&self, id: &str) -> Result<Source> {
        self.load()
            .await?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| FeedwatchError::SourceNotFound(id.to_string()))
    }

    pub async fn add(&self, input: SourceInput) -> Result<Source> {
        let url = non_blank(input.url.as_deref())
            .ok_or_else(|| FeedwatchError::Config("url is required".into()))?;
        Url::parse(&url)?;

        let mode = if input.scrape {
            let selectors = ScrapeSelectors {
                title_selector: non_blank(input.title_selector.as_deref()).unwrap_or_default(),
                link_selector: non_blank(input.link_selector.as_deref()).unwrap_or_default(),
                description_selector: non_blank(input.description_selector.as_deref()),
            };
            selectors.validate()?;
            SourceMode::Scrape(selectors)
        } else {
            SourceMode::Syndication
        };

        let mut source = Source::new(Uuid::new_v4().to_string(), url.clone(), mode);
        source.title = non_blank(input.title.as_deref()).unwrap_or(url);
        source.group = non_blank(input.group.as_deref());
        source.interval_minutes = input
            .interval_minutes
            .map(clamp_interval)
            .unwrap_or(DEFAULT_INTERVAL_MINUTES);
        source.link_prefix = non_blank(input.link_prefix.as_deref());

        let mut sources = self.load().await?;
        sources.push(source.clone());
        self.save(&sources).await?;

        info!(source = %source.id, url = %source.url, scrape = source.mode.is_scrape(), "Added source");
        Ok(source)
    }

    /// Apply only the supplied fields. A blank optional string clears it.
    pub async fn update(&self, id: &str, patch: SourcePatch) -> Result<Source> {
        if patch.is_empty() {
            return Err(FeedwatchError::Config(
                "Provide at least one field to update".into(),
            ));
        }

        let mut sources = self.load().await?;
        let source = sources
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| FeedwatchError::SourceNotFound(id.to_string()))?;

        if let Some(url) = patch.url.as_deref() {
            let url = non_blank(Some(url))
                .ok_or_else(|| FeedwatchError::Config("url is required".into()))?;
            Url::parse(&url)?;
            source.url = url;
        }
        if let Some(title) = patch.title.as_deref() {
            source.title = non_blank(Some(title)).unwrap_or_else(|| source.url.clone());
        }
        if let Some(group) = patch.group.as_deref() {
            source.group = non_blank(Some(group));
        }
        if let Some(minutes) = patch.interval_minutes {
            source.interval_minutes = clamp_interval(minutes);
        }
        if let Some(prefix) = patch.link_prefix.as_deref() {
            source.link_prefix = non_blank(Some(prefix));
        }

        let scrape = patch.scrape.unwrap_or(source.mode.is_scrape());
        let touches_selectors = patch.title_selector.is_some()
            || patch.link_selector.is_some()
            || patch.description_selector.is_some();
        if scrape {
            if !source.mode.is_scrape() || touches_selectors {
                let mut selectors = match &source.mode {
                    SourceMode::Scrape(existing) => existing.clone(),
                    SourceMode::Syndication => ScrapeSelectors::default(),
                };
                if let Some(title) = patch.title_selector.as_deref() {
                    selectors.title_selector = non_blank(Some(title)).unwrap_or_default();
                }
                if let Some(link) = patch.link_selector.as_deref() {
                    selectors.link_selector = non_blank(Some(link)).unwrap_or_default();
                }
                if let Some(description) = patch.description_selector.as_deref() {
                    selectors.description_selector = non_blank(Some(description));
                }
                selectors.validate()?;
                source.mode = SourceMode::Scrape(selectors);
            }
        } else {
            source.mode = SourceMode::Syndication;
        }

        source.updated_at = Some(Utc::now());
        let updated = source.clone();
        self.save(&sources).await?;

        info!(source = %updated.id, "Updated source");
        Ok(updated)
    }

    pub async fn remove(&self, id: &str) -> Result<Source> {
        let mut sources = self.load().await?;
        let index = sources
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| FeedwatchError::SourceNotFound(id.to_string()))?;
        let removed = sources.remove(index);
        self.save(&sources).await?;

        info!(source = %removed.id, url = %removed.url, "Removed source");
        Ok(removed)
    }
}
