use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::app::{FeedwatchError, Result};
use crate::store::KvStore;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

/// In-process store. Its clock can be moved forward to simulate expiry.
pub struct MemoryKv {
    entries: Mutex<HashMap<String, Entry>>,
    offset: Mutex<TimeDelta>,
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryKv {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            offset: Mutex::new(TimeDelta::zero()),
        }
    }

    /// Shift this store's notion of "now" forward.
    pub fn advance(&self, by: TimeDelta) {
        if let Ok(mut offset) = self.offset.lock() {
            *offset += by;
        }
    }

    fn now(&self) -> DateTime<Utc> {
        let offset = self.offset.lock().map(|o| *o).unwrap_or(TimeDelta::zero());
        Utc::now() + offset
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>> {
        self.entries
            .lock()
            .map_err(|e| FeedwatchError::Other(format!("Store lock poisoned: {}", e)))
    }

    /// Live keys starting with `prefix`.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let now = self.now();
        let Ok(entries) = self.entries.lock() else {
            return Vec::new();
        };
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(k, e)| k.starts_with(prefix) && e.expires_at.is_none_or(|t| t > now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = self.now();
        let mut entries = self.entries()?;
        let found = entries
            .get(key)
            .map(|e| (e.value.clone(), e.expires_at.is_some_and(|t| t <= now)));
        match found {
            Some((_, true)) => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, false)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let expires_at = ttl.map(|ttl| {
            let delta = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
            self.now()
                .checked_add_signed(delta)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        });
        self.entries()?.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = self.now();
        let mut entries = self.entries()?;
        let before = entries.len();
        entries.retain(|_, e| e.expires_at.is_none_or(|t| t > now));
        Ok(before - entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_put_delete() {
        tokio_test::block_on(async {
            let store = MemoryKv::new();
            store.put("k", "v", None).await.unwrap();
            assert_eq!(store.get("k").await.unwrap(), Some("v".into()));
            store.delete("k").await.unwrap();
            assert_eq!(store.get("k").await.unwrap(), None);
        });
    }

    #[test]
    fn test_advance_expires_entries() {
        tokio_test::block_on(async {
            let store = MemoryKv::new();
            store
                .put("short", "1", Some(Duration::from_secs(60)))
                .await
                .unwrap();
            store.put("forever", "1", None).await.unwrap();

            store.advance(TimeDelta::seconds(59));
            assert!(store.get("short").await.unwrap().is_some());

            store.advance(TimeDelta::seconds(2));
            assert!(store.get("short").await.unwrap().is_none());
            assert!(store.get("forever").await.unwrap().is_some());
        });
    }

    #[test]
    fn test_huge_ttl_saturates() {
        tokio_test::block_on(async {
            let store = MemoryKv::new();
            store
                .put("far", "1", Some(Duration::from_secs(u64::MAX)))
                .await
                .unwrap();
            store.advance(TimeDelta::days(365));
            assert_eq!(store.get("far").await.unwrap(), Some("1".into()));
        });
    }

    #[test]
    fn test_purge_and_prefix_listing() {
        tokio_test::block_on(async {
            let store = MemoryKv::new();
            store
                .put("sent:a:1", "1", Some(Duration::from_secs(10)))
                .await
                .unwrap();
            store.put("sent:a:2", "1", None).await.unwrap();
            store.put("other", "1", None).await.unwrap();

            assert_eq!(store.keys_with_prefix("sent:"), vec!["sent:a:1", "sent:a:2"]);

            store.advance(TimeDelta::seconds(11));
            assert_eq!(store.keys_with_prefix("sent:"), vec!["sent:a:2"]);
            assert_eq!(store.purge_expired().await.unwrap(), 1);
        });
    }
}
