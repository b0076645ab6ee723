use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;

use crate::app::{FeedwatchError, Result};
use crate::config::HttpConfig;
use crate::fetcher::{FetchKind, Fetcher, FEED_ACCEPT};

pub struct HttpFetcher {
    client: Client,
    page_user_agent: String,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("feedwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            page_user_agent: config.user_agent.clone(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, kind: FetchKind) -> Result<String> {
        let request = match kind {
            FetchKind::Feed => self.client.get(url).header(ACCEPT, FEED_ACCEPT),
            FetchKind::Page => self
                .client
                .get(url)
                .header(USER_AGENT, self.page_user_agent.as_str()),
        };

        let response = request
            .send()
            .await
            .map_err(|e| FeedwatchError::Fetch(format!("Fetch failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedwatchError::Fetch(format!(
                "Fetch failed ({})",
                status.as_u16()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| FeedwatchError::Fetch(format!("Failed to read body: {}", e)))
    }
}
