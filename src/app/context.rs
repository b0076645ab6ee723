use std::sync::Arc;

use crate::app::error::{FeedwatchError, Result};
use crate::config::Config;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::notifier::{Envelope, MailgunNotifier, Notifier};
use crate::orchestrator::Orchestrator;
use crate::registry::SourceRegistry;
use crate::store::{KvStore, MemoryKv, SqliteKv};

pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn KvStore>,
    pub fetcher: Arc<dyn Fetcher>,
    pub registry: SourceRegistry,
    pub orchestrator: Orchestrator,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = config
            .storage_path()
            .map_err(|e| FeedwatchError::Config(e.to_string()))?;
        let store: Arc<dyn KvStore> = Arc::new(SqliteKv::new(&db_path)?);
        Self::with_store(config, store)
    }

    /// Context backed by a throwaway in-process store.
    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_store(config, Arc::new(MemoryKv::new()))
    }

    fn with_store(config: Config, store: Arc<dyn KvStore>) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.http)?);
        let notifier: Arc<dyn Notifier> = Arc::new(MailgunNotifier::new(&config.mail)?);
        let envelope = Envelope::new(&config.mail.from, &config.mail.recipient);

        let registry = SourceRegistry::new(store.clone());
        let orchestrator = Orchestrator::new(store.clone(), fetcher.clone(), notifier, envelope);

        Ok(Self {
            config,
            store,
            fetcher,
            registry,
            orchestrator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceInput;

    #[tokio::test]
    async fn test_in_memory_context_round_trips_sources() {
        let ctx = AppContext::in_memory(Config::default()).unwrap();
        ctx.registry
            .add(SourceInput {
                url: Some("https://example.com/feed.xml".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(ctx.registry.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_context_uses_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.path = Some(dir.path().join("fw.db"));

        let ctx = AppContext::new(config).unwrap();
        assert!(ctx.registry.list().await.unwrap().is_empty());
        assert!(dir.path().join("fw.db").exists());
    }
}
