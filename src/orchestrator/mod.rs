//! One polling run over every configured source.
//!
//! Each source is either skipped (its interval hasn't elapsed), or fetched and
//! filtered against the seen set. Surviving items are bucketed by group, one
//! digest goes out per group, and only delivered items are marked seen. The
//! source list is loaded once and written back once, under [`RunLock`].

pub mod lock;

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::app::Result;
use crate::domain::{Item, Source, SourceMode, DEFAULT_GROUP};
use crate::fetcher::{FetchKind, Fetcher};
use crate::normalizer::Normalizer;
use crate::notifier::{render_digest, DigestSection, Envelope, NotificationRequest, Notifier};
use crate::registry::SourceRegistry;
use crate::scraper::SelectorScraper;
use crate::seen::SeenSet;
use crate::store::KvStore;

pub use lock::{RunLock, LOCK_KEY, LOCK_TTL};

/// Aggregate outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub sources_checked: usize,
    pub sources_with_new_items: usize,
    pub total_new_items: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
    pub message: String,
}

impl RunReport {
    fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

/// New items found for one source, by index into the loaded list.
struct Job {
    index: usize,
    items: Vec<Item>,
}

pub struct Orchestrator {
    registry: SourceRegistry,
    seen: SeenSet,
    lock: RunLock,
    fetcher: Arc<dyn Fetcher>,
    notifier: Arc<dyn Notifier>,
    normalizer: Normalizer,
    scraper: SelectorScraper,
    envelope: Envelope,
}

impl Orchestrator {
    pub fn new(
        kv: Arc<dyn KvStore>,
        fetcher: Arc<dyn Fetcher>,
        notifier: Arc<dyn Notifier>,
        envelope: Envelope,
    ) -> Self {
        Self {
            registry: SourceRegistry::new(kv.clone()),
            seen: SeenSet::new(kv.clone()),
            lock: RunLock::new(kv),
            fetcher,
            notifier,
            normalizer: Normalizer::new(),
            scraper: SelectorScraper::new(),
            envelope,
        }
    }

    pub async fn run(&self) -> RunReport {
        self.run_at(Utc::now()).await
    }

    /// Run with `now` as the single timestamp for every source.
    pub async fn run_at(&self, now: DateTime<Utc>) -> RunReport {
        let token = match self.lock.acquire().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                info!("Another run holds the lock, skipping");
                return RunReport::with_message("Another run is in progress.");
            }
            Err(e) => {
                error!(error = %e, "Failed to acquire run lock");
                return RunReport::with_message(format!("Failed to acquire run lock: {}", e));
            }
        };

        let report = self.run_locked(now, &token).await;

        if let Err(e) = self.lock.release(&token).await {
            warn!(error = %e, "Failed to release run lock");
        }

        report
    }

    async fn run_locked(&self, now: DateTime<Utc>, token: &str) -> RunReport {
        let mut sources = match self.registry.load().await {
            Ok(sources) => sources,
            Err(e) => {
                error!(error = %e, "Failed to load sources");
                return RunReport::with_message(format!("Failed to load sources: {}", e));
            }
        };

        if sources.is_empty() {
            return RunReport::with_message("No sources configured.");
        }

        let mut report = RunReport {
            sources_checked: sources.len(),
            ..RunReport::default()
        };

        let mut jobs = Vec::new();
        for (index, source) in sources.iter_mut().enumerate() {
            if let Some(wait) = minutes_until_due(source, now) {
                debug!(source = %source.id, wait, "Skipping source");
                source.last_run_summary = Some(format!("Skipped (next check in {} min)", wait));
                continue;
            }

            self.keep_lock(token).await;
            match self.collect_new_items(source).await {
                Ok(items) if !items.is_empty() => {
                    info!(source = %source.id, new = items.len(), "Queued new items");
                    source.last_run_summary = Some(format!("Queued {} new item(s)", items.len()));
                    report.total_new_items += items.len();
                    jobs.push(Job { index, items });
                }
                Ok(_) => {
                    debug!(source = %source.id, "No new items");
                    source.last_run_summary = Some("No new items".to_string());
                }
                Err(e) => {
                    warn!(source = %source.id, url = %source.url, error = %e, "Source failed");
                    source.last_run_summary = Some(format!("Failed: {}", e));
                }
            }
            source.last_run_at = Some(now);
        }
        report.sources_with_new_items = jobs.len();

        let groups = group_jobs(&sources, jobs);
        for (group, jobs) in &groups {
            let request = {
                let sections: Vec<DigestSection<'_>> = jobs
                    .iter()
                    .map(|job| DigestSection {
                        source: &sources[job.index],
                        items: &job.items,
                    })
                    .collect();
                NotificationRequest::new(&self.envelope, render_digest(group, &sections))
            };

            match self.notifier.send(&request).await {
                Ok(()) => {
                    report.notifications_sent += 1;
                    info!(group = %group, sources = jobs.len(), "Digest sent");
                    for job in jobs {
                        let source = &mut sources[job.index];
                        for item in &job.items {
                            // The digest is out; a failed mark only risks a resend.
                            if let Err(e) = self.seen.mark_seen(&source.id, &item.id).await {
                                error!(source = %source.id, item = %item.id, error = %e, "Failed to mark item seen");
                            }
                        }
                        source.last_run_summary = Some(sent_summary(job.items.len(), group));
                    }
                }
                Err(e) => {
                    report.notifications_failed += 1;
                    error!(group = %group, error = %e, "Failed to send digest");
                    for job in jobs {
                        sources[job.index].last_run_summary = Some(format!("Email failed: {}", e));
                    }
                }
            }
        }

        report.message = if report.notifications_sent > 0 {
            format!(
                "Sent {} digest(s) for {} group(s).",
                report.notifications_sent,
                groups.len()
            )
        } else if report.notifications_failed > 0 {
            format!("Failed to send {} digest(s).", report.notifications_failed)
        } else {
            "Nothing to send (no new items).".to_string()
        };

        if let Err(e) = self.registry.save(&sources).await {
            error!(error = %e, "Failed to save sources");
            report.message = format!("{} Failed to save sources: {}", report.message, e);
        }

        info!(
            checked = report.sources_checked,
            with_new = report.sources_with_new_items,
            new_items = report.total_new_items,
            sent = report.notifications_sent,
            failed = report.notifications_failed,
            "Run complete"
        );

        report
    }

    /// Restart the lock TTL before each fetch so a slow run outlives it.
    async fn keep_lock(&self, token: &str) {
        match self.lock.refresh(token).await {
            Ok(true) => {}
            Ok(false) => warn!("Run lock expired or was taken over mid-run"),
            Err(e) => warn!(error = %e, "Failed to refresh run lock"),
        }
    }

    /// Extract items for `source` and drop the ones already delivered.
    async fn collect_new_items(&self, source: &Source) -> Result<Vec<Item>> {
        let items = self.extract(source).await?;

        let mut fresh = Vec::new();
        for item in items {
            if !self.seen.was_seen(&source.id, &item.id).await? {
                fresh.push(item);
            }
        }
        Ok(fresh)
    }

    async fn extract(&self, source: &Source) -> Result<Vec<Item>> {
        match &source.mode {
            SourceMode::Syndication => {
                let xml = self.fetcher.fetch(&source.url, FetchKind::Feed).await?;
                self.normalizer.normalize(&xml, &source.url)
            }
            SourceMode::Scrape(selectors) => {
                selectors.validate()?;
                let html = self.fetcher.fetch(&source.url, FetchKind::Page).await?;
                self.scraper.scrape(&source.id, &html, &source.url, selectors)
            }
        }
    }
}

/// Whole minutes (rounded up) until `source` is due, or `None` if due now.
fn minutes_until_due(source: &Source, now: DateTime<Utc>) -> Option<i64> {
    let last_run = source.last_run_at?;
    let interval = TimeDelta::minutes(i64::from(source.effective_interval()));
    let elapsed = now - last_run;
    if elapsed >= interval {
        return None;
    }
    let remaining_ms = (interval - elapsed).num_milliseconds();
    Some((remaining_ms + 59_999) / 60_000)
}

fn sent_summary(count: usize, group: &str) -> String {
    if group == DEFAULT_GROUP {
        format!("Sent {} new item(s)", count)
    } else {
        format!("Sent {} new item(s) (group: {})", count, group)
    }
}

/// Bucket jobs by group label, keeping first-appearance order.
fn group_jobs(sources: &[Source], jobs: Vec<Job>) -> Vec<(String, Vec<Job>)> {
    let mut groups: Vec<(String, Vec<Job>)> = Vec::new();
    for job in jobs {
        let label = sources[job.index].group_label();
        match groups.iter_mut().find(|(g, _)| g == label) {
            Some((_, bucket)) => bucket.push(job),
            None => groups.push((label.to_string(), vec![job])),
        }
    }
    groups
}
