use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;
use url::form_urlencoded;

use crate::app::{FeedwatchError, Result};
use crate::config::MailConfig;
use crate::notifier::{NotificationRequest, Notifier};

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

pub struct MailgunNotifier {
    client: Client,
    api_base: String,
    api_key: String,
    domain: String,
}

impl MailgunNotifier {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let client = Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            domain: config.domain.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}/messages", self.api_base, self.domain)
    }

    fn check_credentials(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(FeedwatchError::Notification("Mailgun API key missing".into()));
        }
        if self.domain.trim().is_empty() {
            return Err(FeedwatchError::Notification("Mailgun domain missing".into()));
        }
        Ok(())
    }
}

fn form_body(request: &NotificationRequest) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("from", &request.from_address)
        .append_pair("to", &request.to_address)
        .append_pair("subject", &request.subject)
        .append_pair("text", &request.text_body)
        .append_pair("html", &request.html_body)
        .finish()
}

#[async_trait]
impl Notifier for MailgunNotifier {
    async fn send(&self, request: &NotificationRequest) -> Result<()> {
        self.check_credentials()?;

        debug!(subject = %request.subject, to = %request.to_address, "Sending digest via Mailgun");

        let response = self
            .client
            .post(self.endpoint())
            .basic_auth("api", Some(&self.api_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form_body(request))
            .send()
            .await
            .map_err(|e| FeedwatchError::Notification(format!("Mailgun unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedwatchError::Notification(format!(
                "Mailgun error ({}): {}",
                status.as_u16(),
                body
            )));
        }

        Ok(())
    }
}
