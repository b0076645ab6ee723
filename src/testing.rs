//! Test doubles shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::app::{FeedwatchError, Result};
use crate::fetcher::{FetchKind, Fetcher};
use crate::notifier::{NotificationRequest, Notifier};

/// Serves canned bodies or errors by URL. Unknown URLs fail like a 404.
#[derive(Default)]
pub struct StaticFetcher {
    responses: HashMap<String, std::result::Result<String, String>>,
    calls: Mutex<Vec<(String, FetchKind)>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: &str) -> Self {
        self.responses.insert(url.to_string(), Ok(body.to_string()));
        self
    }

    pub fn with_error(mut self, url: &str, message: &str) -> Self {
        self.responses
            .insert(url.to_string(), Err(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<(String, FetchKind)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str, kind: FetchKind) -> Result<String> {
        self.calls.lock().unwrap().push((url.to_string(), kind));
        match self.responses.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(message)) => Err(FeedwatchError::Fetch(message.clone())),
            None => Err(FeedwatchError::Fetch("Fetch failed (404)".into())),
        }
    }
}

/// Records every request; subjects listed via `failing` are rejected.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<NotificationRequest>>,
    failing: HashSet<String>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, subject: &str) -> Self {
        self.failing.insert(subject.to_string());
        self
    }

    pub fn sent(&self) -> Vec<NotificationRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, request: &NotificationRequest) -> Result<()> {
        if self.failing.contains(&request.subject) {
            return Err(FeedwatchError::Notification(format!(
                "Mailgun error (500): rejected {}",
                request.subject
            )));
        }
        self.sent.lock().unwrap().push(request.clone());
        Ok(())
    }
}
