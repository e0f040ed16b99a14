//! Notification channels
//!
//! Email goes through an HTTP mail relay (`POST relay_url`); inbox
//! messages go to screenpipe's `POST /inbox`.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::{EndpointConfig, MailConfig};
use crate::types::{DigestError, Result};

pub const EMAIL_CHANNEL: &str = "email";
pub const INBOX_CHANNEL: &str = "inbox";

// =============================================================================
// Messages
// =============================================================================

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub credential: SecretString,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn new(
        to: impl Into<String>,
        credential: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            credential: SecretString::from(credential.into()),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxMessage {
    pub title: String,
    pub body: String,
}

// =============================================================================
// Delivery outcome
// =============================================================================

/// Per-channel delivery outcome reported back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum NotificationResult {
    Sent,
    Skipped(String),
    Failed(String),
}

impl NotificationResult {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationReport {
    pub email: NotificationResult,
    pub inbox: NotificationResult,
}

impl Default for NotificationReport {
    fn default() -> Self {
        Self {
            email: NotificationResult::Skipped("not attempted".to_string()),
            inbox: NotificationResult::Skipped("not attempted".to_string()),
        }
    }
}

// =============================================================================
// Channels
// =============================================================================

#[async_trait]
pub trait EmailChannel: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

#[async_trait]
pub trait InboxChannel: Send + Sync {
    async fn send(&self, message: &InboxMessage) -> Result<()>;
}

pub type SharedEmailChannel = Arc<dyn EmailChannel>;
pub type SharedInboxChannel = Arc<dyn InboxChannel>;

fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DigestError::Config(format!("Failed to create HTTP client: {}", e)))
}

async fn post_json<T: Serialize + ?Sized>(
    client: &reqwest::Client,
    url: &str,
    body: &T,
    channel: &str,
) -> Result<()> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| DigestError::notification(channel, e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(DigestError::notification(
            channel,
            format!("{} returned {}: {}", url, status, text),
        ));
    }
    Ok(())
}

/// Email through an HTTP mail relay
#[derive(Debug, Clone)]
pub struct MailRelayClient {
    relay_url: String,
    client: reqwest::Client,
}

impl MailRelayClient {
    pub fn new(config: &MailConfig) -> Result<Self> {
        url::Url::parse(&config.relay_url).map_err(|e| {
            DigestError::Config(format!("Invalid mail relay URL '{}': {}", config.relay_url, e))
        })?;
        Ok(Self {
            relay_url: config.relay_url.clone(),
            client: http_client(std::time::Duration::from_secs(config.timeout_secs.max(1)))?,
        })
    }
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    to: &'a str,
    from: &'a str,
    password: &'a str,
    subject: &'a str,
    body: &'a str,
}

#[async_trait]
impl EmailChannel for MailRelayClient {
    #[instrument(skip_all, fields(subject = %message.subject))]
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let request = RelayRequest {
            to: &message.to,
            from: &message.to,
            password: message.credential.expose_secret(),
            subject: &message.subject,
            body: &message.body,
        };
        post_json(&self.client, &self.relay_url, &request, EMAIL_CHANNEL).await?;
        debug!("Email handed to relay");
        Ok(())
    }
}

/// screenpipe inbox
#[derive(Debug, Clone)]
pub struct ScreenpipeInbox {
    url: String,
    client: reqwest::Client,
}

impl ScreenpipeInbox {
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        let base = url::Url::parse(&config.api_base).map_err(|e| {
            DigestError::Config(format!("Invalid inbox URL '{}': {}", config.api_base, e))
        })?;
        Ok(Self {
            url: format!("{}/inbox", base.as_str().trim_end_matches('/')),
            client: http_client(config.timeout())?,
        })
    }
}

#[async_trait]
impl InboxChannel for ScreenpipeInbox {
    #[instrument(skip_all, fields(title = %message.title))]
    async fn send(&self, message: &InboxMessage) -> Result<()> {
        post_json(&self.client, &self.url, message, INBOX_CHANNEL).await?;
        debug!("Inbox message delivered");
        Ok(())
    }
}
