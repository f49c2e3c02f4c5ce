//! Outbound WhatsApp delivery via the Twilio Messages REST API.
//!
//! - `MessageSender` - seam used by the webhook to deliver replies
//! - `TwilioClient` - `POST /2010-04-01/Accounts/{sid}/Messages.json` with basic auth

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use stockbot_core::config::TwilioConfig;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("message delivery request failed: {0}")]
    Transport(String),
    #[error("messaging api rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("messaging api response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct DeliveryReceipt {
    #[serde(rename = "sid")]
    pub message_sid: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, body: &str, recipient: &str) -> Result<DeliveryReceipt, DeliveryError>;
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone, Debug)]
pub struct TwilioClient {
    client: Client,
    api_base_url: String,
    account_sid: String,
    auth_token: SecretString,
    from_number: String,
}

impl TwilioClient {
    pub fn new(config: &TwilioConfig) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
        })
    }

    pub fn from_number(&self) -> &str {
        &self.from_number
    }

    fn messages_url(&self) -> String {
        format!("{}/2010-04-01/Accounts/{}/Messages.json", self.api_base_url, self.account_sid)
    }
}

#[async_trait]
impl MessageSender for TwilioClient {
    async fn send(&self, body: &str, recipient: &str) -> Result<DeliveryReceipt, DeliveryError> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&[("From", self.from_number.as_str()), ("To", recipient), ("Body", body)])
            .send()
            .await
            .map_err(|error| DeliveryError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TwilioErrorBody>(&raw)
                .ok()
                .and_then(|body| body.message)
                .unwrap_or(raw);
            return Err(DeliveryError::Rejected { status: status.as_u16(), message });
        }

        let receipt: DeliveryReceipt =
            response.json().await.map_err(|error| DeliveryError::Decode(error.to_string()))?;
        debug!(
            event_name = "twilio.message.accepted",
            message_sid = %receipt.message_sid,
            "messaging api accepted message"
        );
        Ok(receipt)
    }
}
