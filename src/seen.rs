//! Memory of already-notified items.
//!
//! Each delivered item leaves a marker under `sent:{sourceId}:{hash}` that
//! expires after thirty days. Once it expires, an identical item that shows up
//! again counts as new.

use std::sync::Arc;
use std::time::Duration;

use crate::app::{FeedwatchError, Result};
use crate::domain::seen_fingerprint;
use crate::store::KvStore;

pub const SENT_PREFIX: &str = "sent:";
pub const SENT_TTL: Duration = Duration::from_secs(2_592_000);

const MARKER: &str = "1";

#[derive(Clone)]
pub struct SeenSet {
    kv: Arc<dyn KvStore>,
}

impl SeenSet {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    pub fn key(source_id: &str, item_id: &str) -> String {
        format!(
            "{}{}:{}",
            SENT_PREFIX,
            source_id,
            seen_fingerprint(source_id, item_id)
        )
    }

    pub async fn was_seen(&self, source_id: &str, item_id: &str) -> Result<bool> {
        let value = self
            .kv
            .get(&Self::key(source_id, item_id))
            .await
            .map_err(|e| FeedwatchError::SeenStore(e.to_string()))?;
        Ok(value.is_some())
    }

    /// Re-marking refreshes the expiry and is otherwise a no-op.
    pub async fn mark_seen(&self, source_id: &str, item_id: &str) -> Result<()> {
        self.kv
            .put(&Self::key(source_id, item_id), MARKER, Some(SENT_TTL))
            .await
            .map_err(|e| FeedwatchError::SeenStore(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::store::MemoryKv;

    #[test]
    fn test_key_shape() {
        let key = SeenSet::key("src-1", "guid-1");
        assert!(key.starts_with("sent:src-1:"));
        assert_eq!(key.len(), "sent:src-1:".len() + 64);
        assert_ne!(key, SeenSet::key("src-2", "guid-1"));
    }

    #[tokio::test]
    async fn test_was_seen_is_stable_without_marking() {
        let seen = SeenSet::new(Arc::new(MemoryKv::new()));
        let first = seen.was_seen("s", "i").await.unwrap();
        let second = seen.was_seen("s", "i").await.unwrap();
        assert!(!first);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_mark_seen_is_idempotent() {
        let seen = SeenSet::new(Arc::new(MemoryKv::new()));
        seen.mark_seen("s", "i").await.unwrap();
        seen.mark_seen("s", "i").await.unwrap();
        assert!(seen.was_seen("s", "i").await.unwrap());
        assert!(!seen.was_seen("other", "i").await.unwrap());
    }

    #[tokio::test]
    async fn test_marker_expires_after_thirty_days() {
        let kv = Arc::new(MemoryKv::new());
        let seen = SeenSet::new(kv.clone());
        seen.mark_seen("s", "i").await.unwrap();

        kv.advance(TimeDelta::days(29));
        assert!(seen.was_seen("s", "i").await.unwrap());

        kv.advance(TimeDelta::days(1) + TimeDelta::seconds(1));
        assert!(!seen.was_seen("s", "i").await.unwrap());
    }
}
