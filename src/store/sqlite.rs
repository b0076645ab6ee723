use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::{FeedwatchError, Result};
use crate::store::KvStore;

pub struct SqliteKv {
    conn: Mutex<Connection>,
}

impl SqliteKv {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| FeedwatchError::Other(format!("Migration failed: {}", e)))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| FeedwatchError::Other(format!("Database lock poisoned: {}", e)))
    }

    fn expiry(ttl: Option<Duration>) -> Option<i64> {
        ttl.map(|ttl| {
            let secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
            Utc::now().timestamp().saturating_add(secs)
        })
    }
}

#[async_trait]
impl KvStore for SqliteKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;

        let row: Option<(String, Option<i64>)> = conn
            .query_row(
                "SELECT value, expires_at FROM kv WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((_, Some(expires_at))) if expires_at <= Utc::now().timestamp() => {
                conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO kv (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
            params![key, value, Self::expiry(ttl)],
        )?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM kv WHERE expires_at IS NOT NULL AND expires_at <= ?1",
            params![Utc::now().timestamp()],
        )?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = SqliteKv::in_memory().unwrap();
        store.put("a", "1", None).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some("1".into()));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = SqliteKv::in_memory().unwrap();
        store.put("a", "1", None).await.unwrap();
        store.put("a", "2", Some(Duration::from_secs(60))).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some("2".into()));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = SqliteKv::in_memory().unwrap();
        store.put("a", "1", None).await.unwrap();
        store.delete("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
        // Deleting a missing key is fine.
        store.delete("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_huge_ttl_saturates_instead_of_expiring() {
        let store = SqliteKv::in_memory().unwrap();
        store
            .put("far", "1", Some(Duration::from_secs(u64::MAX)))
            .await
            .unwrap();
        assert_eq!(store.get("far").await.unwrap(), Some("1".into()));
    }

    #[tokio::test]
    async fn test_expired_entry_not_returned() {
        let store = SqliteKv::in_memory().unwrap();
        store.put("gone", "1", Some(Duration::ZERO)).await.unwrap();
        store
            .put("kept", "1", Some(Duration::from_secs(3600)))
            .await
            .unwrap();

        assert_eq!(store.get("gone").await.unwrap(), None);
        assert_eq!(store.get("kept").await.unwrap(), Some("1".into()));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = SqliteKv::in_memory().unwrap();
        store.put("a", "1", Some(Duration::ZERO)).await.unwrap();
        store.put("b", "1", Some(Duration::ZERO)).await.unwrap();
        store.put("c", "1", None).await.unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 2);
        assert_eq!(store.get("c").await.unwrap(), Some("1".into()));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedwatch.db");

        {
            let store = SqliteKv::new(&path).unwrap();
            store.put("feeds:list", "[]", None).await.unwrap();
        }

        let store = SqliteKv::new(&path).unwrap();
        assert_eq!(store.get("feeds:list").await.unwrap(), Some("[]".into()));
    }
}
