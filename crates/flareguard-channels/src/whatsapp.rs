//! WhatsApp alerts through the CallMeBot click-to-message API.
//!
//! CallMeBot cannot carry attachments, so the frame is first uploaded to an
//! [`ImageHost`] and the alert text links to it. The message itself is a
//! single GET request with the phone number, text, and API key in the query
//! string.

#![cfg(feature = "whatsapp")]

use crate::alert_headline;
use crate::error::ChannelError;
use crate::imgur::ImageHost;
use crate::traits::{AlertChannel, DeliveryReport};
use crate::Result;
use flareguard_core::config::WhatsAppConfig;
use flareguard_core::types::PersistedFrame;
use flareguard_core::SecretString;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// WhatsApp alert channel.
pub struct WhatsAppChannel {
    /// CallMeBot API key.
    api_key: SecretString,

    /// Receiving phone number.
    phone: String,

    /// Webhook endpoint.
    endpoint: String,

    /// Request timeout.
    timeout: Duration,

    /// Host the frame is uploaded to before messaging.
    host: Arc<dyn ImageHost>,
}

impl std::fmt::Debug for WhatsAppChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppChannel")
            .field("phone", &self.phone)
            .field("endpoint", &self.endpoint)
            .field("host", &self.host)
            .finish()
    }
}

impl WhatsAppChannel {
    /// Create a new WhatsApp channel against the public CallMeBot endpoint.
    pub fn new(
        api_key: impl Into<SecretString>,
        phone: impl Into<String>,
        host: Arc<dyn ImageHost>,
    ) -> Self {
        let defaults = WhatsAppConfig::default();
        Self {
            api_key: api_key.into(),
            phone: phone.into(),
            endpoint: defaults.endpoint,
            timeout: Duration::from_secs(defaults.timeout_secs),
            host,
        }
    }

    /// Create from configuration.
    pub fn from_config(config: &WhatsAppConfig, host: Arc<dyn ImageHost>) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_blank())
            .ok_or_else(|| ChannelError::Config("Missing CallMeBot API key".to_string()))?;

        let phone = config
            .phone
            .clone()
            .filter(|phone| !phone.trim().is_empty())
            .ok_or_else(|| ChannelError::Config("Missing WhatsApp receiver number".to_string()))?;

        Ok(Self::new(api_key, phone, host)
            .with_endpoint(config.endpoint.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs)))
    }

    /// Override the webhook endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Receiving phone number.
    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Alert text for an uploaded frame.
    fn message_text(label: &str, image_url: &str) -> String {
        format!("{} View at {}", alert_headline(label), image_url)
    }

    /// Full request URL with every parameter encoded.
    fn message_url(&self, text: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("phone", self.phone.as_str()),
                ("text", text),
                ("apikey", self.api_key.expose_secret()),
            ],
        )
        .map_err(|e| ChannelError::Config(format!("Invalid CallMeBot endpoint: {}", e)))
    }
}

impl AlertChannel for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn deliver(&self, label: &str, frame: &PersistedFrame) -> Result<DeliveryReport> {
        // No link, no message.
        let image_url = self.host.upload(&frame.path)?;

        let text = Self::message_text(label, &image_url);
        let url = self.message_url(&text)?;
        debug!(phone = %self.phone, "Sending WhatsApp alert");

        let client = Client::builder().timeout(self.timeout).build()?;
        let response = client.get(url).send().map_err(|e| {
            error!(phone = %self.phone, error = %e, "WhatsApp request failed");
            ChannelError::from(e)
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().unwrap_or_default();
            warn!(phone = %self.phone, %status, body = %body.trim(), "WhatsApp alert rejected");
            return Err(ChannelError::Delivery(format!("HTTP {}", status)));
        }

        info!(phone = %self.phone, file = frame.file_name(), "WhatsApp alert sent");
        Ok(DeliveryReport::single(self.phone.clone()))
    }
}
