pub mod memory;
pub mod sqlite;

use std::time::Duration;

use async_trait::async_trait;

use crate::app::Result;

pub use memory::MemoryKv;
pub use sqlite::SqliteKv;

/// Key/value store with per-key expiry.
///
/// Expired entries are never returned by `get`.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`; with a TTL the entry disappears once it elapses.
    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Drop expired entries, returning how many were removed.
    async fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }
}
