use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::app::Result;
use crate::store::KvStore;

pub const LOCK_KEY: &str = "run:lock";
pub const LOCK_TTL: Duration = Duration::from_secs(600);

/// Advisory cross-run lock. The TTL frees it if a holder dies mid-run; a live
/// holder calls [`RunLock::refresh`] between sources so long runs keep it.
#[derive(Clone)]
pub struct RunLock {
    kv: Arc<dyn KvStore>,
}

impl RunLock {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Returns the holder token, or `None` when another run owns the lock.
    pub async fn acquire(&self) -> Result<Option<String>> {
        if self.kv.get(LOCK_KEY).await?.is_some() {
            return Ok(None);
        }

        let token = Uuid::new_v4().to_string();
        self.kv.put(LOCK_KEY, &token, Some(LOCK_TTL)).await?;

        // Another run may have written between our get and put.
        match self.kv.get(LOCK_KEY).await? {
            Some(holder) if holder == token => Ok(Some(token)),
            _ => Ok(None),
        }
    }

    /// Restart the TTL if `token` still holds the lock. Returns whether it does.
    pub async fn refresh(&self, token: &str) -> Result<bool> {
        if self.kv.get(LOCK_KEY).await?.as_deref() != Some(token) {
            return Ok(false);
        }
        self.kv.put(LOCK_KEY, token, Some(LOCK_TTL)).await?;
        Ok(true)
    }

    /// Only the current holder's token clears the lock.
    pub async fn release(&self, token: &str) -> Result<()> {
        if self.kv.get(LOCK_KEY).await?.as_deref() == Some(token) {
            self.kv.delete(LOCK_KEY).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKv;

    #[tokio::test]
    async fn test_acquire_and_release() {
        let kv = Arc::new(MemoryKv::new());
        let lock = RunLock::new(kv.clone());

        let token = lock.acquire().await.unwrap().expect("lock should be free");
        assert_eq!(lock.acquire().await.unwrap(), None);

        lock.release(&token).await.unwrap();
        assert!(kv.get(LOCK_KEY).await.unwrap().is_none());
        assert!(lock.acquire().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_release_ignores_foreign_token() {
        let kv = Arc::new(MemoryKv::new());
        let lock = RunLock::new(kv.clone());
        kv.put(LOCK_KEY, "someone-else", Some(LOCK_TTL)).await.unwrap();

        lock.release("mine").await.unwrap();
        assert_eq!(
            kv.get(LOCK_KEY).await.unwrap().as_deref(),
            Some("someone-else")
        );
    }

    #[tokio::test]
    async fn test_refresh_extends_held_lock() {
        let kv = Arc::new(MemoryKv::new());
        let lock = RunLock::new(kv.clone());
        let token = lock.acquire().await.unwrap().unwrap();

        kv.advance(chrono::TimeDelta::minutes(9));
        assert!(lock.refresh(&token).await.unwrap());

        kv.advance(chrono::TimeDelta::minutes(9));
        assert_eq!(kv.get(LOCK_KEY).await.unwrap().as_deref(), Some(token.as_str()));
        assert_eq!(lock.acquire().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_refresh_with_foreign_token_fails() {
        let kv = Arc::new(MemoryKv::new());
        let lock = RunLock::new(kv.clone());
        kv.put(LOCK_KEY, "someone-else", Some(LOCK_TTL)).await.unwrap();

        assert!(!lock.refresh("mine").await.unwrap());
        assert_eq!(
            kv.get(LOCK_KEY).await.unwrap().as_deref(),
            Some("someone-else")
        );
    }

    #[tokio::test]
    async fn test_stale_lock_expires() {
        let kv = Arc::new(MemoryKv::new());
        let lock = RunLock::new(kv.clone());
        lock.acquire().await.unwrap().unwrap();

        kv.advance(chrono::TimeDelta::minutes(11));
        assert!(lock.acquire().await.unwrap().is_some());
    }
}
