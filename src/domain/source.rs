use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::{FeedwatchError, Result};

pub const DEFAULT_INTERVAL_MINUTES: u32 = 60;
pub const DEFAULT_GROUP: &str = "default";

/// Selectors for a scraped page. Title and link are required before a run
/// attempts extraction; description is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeSelectors {
    #[serde(default)]
    pub title_selector: String,
    #[serde(default)]
    pub link_selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_selector: Option<String>,
}

impl ScrapeSelectors {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title_selector: title.into(),
            link_selector: link.into(),
            description_selector: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description_selector = Some(description.into());
        self
    }

    /// Fails with a configuration error unless both required selectors are set.
    pub fn validate(&self) -> Result<()> {
        if self.title_selector.trim().is_empty() || self.link_selector.trim().is_empty() {
            return Err(FeedwatchError::Config(
                "Title and link selectors are required for scraped sources".into(),
            ));
        }
        Ok(())
    }

    pub fn description(&self) -> Option<&str> {
        self.description_selector
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum SourceMode {
    Syndication,
    Scrape(ScrapeSelectors),
}

impl SourceMode {
    pub fn is_scrape(&self) -> bool {
        matches!(self, SourceMode::Scrape(_))
    }
}

fn default_interval() -> u32 {
    DEFAULT_INTERVAL_MINUTES
}

/// One configured feed or scraped page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default = "default_interval")]
    pub interval_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_prefix: Option<String>,
    #[serde(flatten)]
    pub mode: SourceMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_summary: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Source {
    pub fn new(id: impl Into<String>, url: impl Into<String>, mode: SourceMode) -> Self {
        let url = url.into();
        Self {
            id: id.into(),
            title: url.clone(),
            url,
            group: None,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            link_prefix: None,
            mode,
            last_run_at: None,
            last_run_summary: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Digest label; blank or missing groups share the implicit `default` group.
    pub fn group_label(&self) -> &str {
        self.group
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .unwrap_or(DEFAULT_GROUP)
    }

    /// Minimum spacing between runs. A stored zero means "unset".
    pub fn effective_interval(&self) -> u32 {
        if self.interval_minutes == 0 {
            DEFAULT_INTERVAL_MINUTES
        } else {
            self.interval_minutes
        }
    }

    pub fn link_prefix(&self) -> Option<&str> {
        self.link_prefix.as_deref().filter(|p| !p.is_empty())
    }
}

/// Fields accepted when creating a source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInput {
    pub url: Option<String>,
    pub title: Option<String>,
    pub group: Option<String>,
    pub interval_minutes: Option<i64>,
    pub link_prefix: Option<String>,
    pub scrape: bool,
    pub title_selector: Option<String>,
    pub link_selector: Option<String>,
    pub description_selector: Option<String>,
}

/// Partial update of a source; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePatch {
    pub url: Option<String>,
    pub title: Option<String>,
    pub group: Option<String>,
    pub interval_minutes: Option<i64>,
    pub link_prefix: Option<String>,
    pub scrape: Option<bool>,
    pub title_selector: Option<String>,
    pub link_selector: Option<String>,
    pub description_selector: Option<String>,
}

impl SourcePatch {
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.title.is_none()
            && self.group.is_none()
            && self.interval_minutes.is_none()
            && self.link_prefix.is_none()
            && self.scrape.is_none()
            && self.title_selector.is_none()
            && self.link_selector.is_none()
            && self.description_selector.is_none()
    }
}

/// Trimmed value, or `None` when blank.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Interval floor of one minute.
pub fn clamp_interval(minutes: i64) -> u32 {
    minutes.clamp(1, u32::MAX as i64) as u32
}
