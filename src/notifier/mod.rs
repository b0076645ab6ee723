//! Outbound digest delivery.
//!
//! - [`Notifier`]: async trait the run hands each rendered digest to
//! - [`MailgunNotifier`]: Mailgun HTTP API implementation
//! - [`digest`]: subject, text and HTML rendering of a group's new items

pub mod digest;
pub mod mailgun;

use async_trait::async_trait;

use crate::app::Result;

pub use digest::{render_digest, Digest, DigestSection};
pub use mailgun::MailgunNotifier;

/// Sender and recipient of every digest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    pub from_address: String,
    pub to_address: String,
}

impl Envelope {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from_address: from.into(),
            to_address: to.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub from_address: String,
    pub to_address: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl NotificationRequest {
    pub fn new(envelope: &Envelope, digest: Digest) -> Self {
        Self {
            from_address: envelope.from_address.clone(),
            to_address: envelope.to_address.clone(),
            subject: digest.subject,
            text_body: digest.text,
            html_body: digest.html,
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one digest. Any rejection is a `Notification` error.
    async fn send(&self, request: &NotificationRequest) -> Result<()>;
}
