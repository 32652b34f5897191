use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Longest message body the gateway will accept
pub const MAX_MESSAGE_LENGTH: usize = 1600;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("notification rejected before sending: {0}")]
    InvalidRequest(String),

    #[error("gateway returned status {0}")]
    Rejected(u16),

    #[error("gateway unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Outbound notification channel
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send(&self, contact: &str, message: &str) -> Result<(), GatewayError>;
}

#[derive(Debug, Serialize)]
struct Notification<'a> {
    to: &'a str,
    body: &'a str,
}

/// Posts `{ "to", "body" }` to an HTTP notification endpoint
pub struct HttpGateway {
    client: reqwest::Client,
    url: String,
    auth_token: Option<String>,
}

impl HttpGateway {
    pub fn new(url: String, auth_token: Option<String>, timeout_seconds: u64) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(timeout_seconds)).build()?;
        Ok(Self { client, url, auth_token })
    }
}

#[async_trait]
impl NotificationGateway for HttpGateway {
    async fn send(&self, contact: &str, message: &str) -> Result<(), GatewayError> {
        let contact = contact.trim();
        let message = message.trim();
        if contact.is_empty() {
            return Err(GatewayError::InvalidRequest("empty contact".into()));
        }
        if message.is_empty() || message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(GatewayError::InvalidRequest(format!(
                "message must be 1..={MAX_MESSAGE_LENGTH} characters"
            )));
        }

        let mut request = self.client.post(&self.url).json(&Notification { to: contact, body: message });
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(GatewayError::Rejected(response.status().as_u16()));
        }

        tracing::debug!(url = %self.url, "notification accepted by gateway");
        Ok(())
    }
}

/// Gateway used when none is configured: the alert only reaches the log
pub struct LogGateway;

#[async_trait]
impl NotificationGateway for LogGateway {
    async fn send(&self, contact: &str, message: &str) -> Result<(), GatewayError> {
        tracing::warn!(contact = %contact, "alert (no gateway configured): {}", message);
        Ok(())
    }
}
