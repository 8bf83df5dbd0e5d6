//! Telegram photo alerts through the Bot API.
//!
//! The frame is sent as a photo with a short Markdown caption to every
//! registered chat. Recipients are independent: a failed send is logged and
//! the loop moves on to the next chat.

#![cfg(feature = "telegram")]

use crate::alert_headline;
use crate::error::ChannelError;
use crate::traits::{AsyncAlertChannel, DeliveryReport};
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use flareguard_core::config::TelegramConfig;
use flareguard_core::types::{PersistedFrame, RecipientOutcome};
use flareguard_core::SecretString;
use parking_lot::RwLock;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode, Recipient};
use tracing::{debug, error, info, warn};

/// File name attached to uploaded photos.
const PHOTO_FILE_NAME: &str = "image.jpg";

/// Sends a single photo message to one chat.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PhotoSender: Send + Sync + Debug {
    /// Send `photo` to `recipient` with a Markdown `caption`.
    async fn send_photo(&self, recipient: &str, photo: Bytes, caption: &str) -> Result<()>;
}

/// [`PhotoSender`] backed by teloxide.
///
/// A fresh bot client is built for every send so that no connection pool
/// outlives the runtime it was created on.
pub struct TeloxideSender {
    token: SecretString,
    api_url: Option<reqwest::Url>,
    timeout: Duration,
}

impl Debug for TeloxideSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeloxideSender")
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TeloxideSender {
    /// Create a sender for the given bot token.
    pub fn new(token: impl Into<SecretString>) -> Self {
        Self {
            token: token.into(),
            api_url: None,
            timeout: Duration::from_secs(TelegramConfig::default().timeout_secs),
        }
    }

    /// Create from configuration.
    pub fn from_config(config: &TelegramConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .filter(|token| !token.is_blank())
            .ok_or_else(|| ChannelError::Config("Missing Telegram bot token".to_string()))?;

        let mut sender =
            Self::new(token).with_timeout(Duration::from_secs(config.timeout_secs));
        if let Some(api_url) = &config.api_url {
            sender = sender.with_api_url(api_url)?;
        }
        Ok(sender)
    }

    /// Point the bot at a different Bot API server.
    pub fn with_api_url(mut self, api_url: &str) -> Result<Self> {
        let url = reqwest::Url::parse(api_url)
            .map_err(|e| ChannelError::Config(format!("Invalid Telegram API URL: {}", e)))?;
        self.api_url = Some(url);
        Ok(self)
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn bot(&self) -> Result<Bot> {
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        let bot = Bot::with_client(self.token.expose_secret(), client);
        Ok(match &self.api_url {
            Some(url) => bot.set_api_url(url.clone()),
            None => bot,
        })
    }
}

#[async_trait]
impl PhotoSender for TeloxideSender {
    async fn send_photo(&self, recipient: &str, photo: Bytes, caption: &str) -> Result<()> {
        let bot = self.bot()?;
        let photo = InputFile::memory(photo.to_vec()).file_name(PHOTO_FILE_NAME);

        bot.send_photo(parse_recipient(recipient), photo)
            .caption(caption)
            .parse_mode(caption_mode())
            .await
            .map_err(|e| ChannelError::channel("telegram", e.to_string()))?;

        Ok(())
    }
}

/// Numeric ids address chats directly; anything else is a public
/// `@channel` username.
fn parse_recipient(recipient: &str) -> Recipient {
    match recipient.trim().parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(recipient.trim().to_string()),
    }
}

#[allow(deprecated)]
fn caption_mode() -> ParseMode {
    ParseMode::Markdown
}

/// Escape characters that legacy Markdown treats as entity delimiters.
///
/// Only valid outside an entity; Telegram keeps the backslash inside one.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Caption for a detection with the given label, as plain escaped text.
pub fn alert_caption(label: &str) -> String {
    escape_markdown(&alert_headline(label))
}

/// Telegram alert channel.
#[derive(Debug)]
pub struct TelegramChannel {
    sender: Arc<dyn PhotoSender>,
    recipients: RwLock<Vec<String>>,
}

impl TelegramChannel {
    /// Create a channel with no recipients.
    pub fn new(sender: Arc<dyn PhotoSender>) -> Self {
        Self {
            sender,
            recipients: RwLock::new(Vec::new()),
        }
    }

    /// Create from configuration, seeding the default chat when one is set.
    pub fn from_config(config: &TelegramConfig) -> Result<Self> {
        let channel = Self::new(Arc::new(TeloxideSender::from_config(config)?));
        if let Some(chat_id) = &config.chat_id {
            channel.register_recipient(chat_id);
        }
        Ok(channel)
    }

    /// Add a chat to the recipient list.
    ///
    /// Returns `false` if the id is blank or already registered.
    pub fn register_recipient(&self, recipient: &str) -> bool {
        let recipient = recipient.trim();
        if recipient.is_empty() {
            return false;
        }

        let mut recipients = self.recipients.write();
        if recipients.iter().any(|r| r == recipient) {
            return false;
        }
        recipients.push(recipient.to_string());
        info!(recipient, "Registered Telegram recipient");
        true
    }

    /// Registered chats, in send order.
    pub fn recipients(&self) -> Vec<String> {
        self.recipients.read().clone()
    }
}

#[async_trait]
impl AsyncAlertChannel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn deliver(&self, label: &str, frame: &PersistedFrame) -> Result<DeliveryReport> {
        if tokio::fs::metadata(&frame.path).await.is_err() {
            error!(path = %frame.path.display(), "Telegram alert skipped: frame file is missing");
            return Err(ChannelError::MissingImage(frame.path.clone()));
        }
        let photo = Bytes::from(tokio::fs::read(&frame.path).await?);

        // Snapshot so registration never waits on network sends.
        let recipients = self.recipients();
        if recipients.is_empty() {
            warn!("No Telegram recipients registered");
        }

        let caption = alert_caption(label);
        let mut report = DeliveryReport::new();
        for recipient in recipients {
            debug!(%recipient, "Sending Telegram photo");
            match self
                .sender
                .send_photo(&recipient, photo.clone(), &caption)
                .await
            {
                Ok(()) => {
                    info!(%recipient, file = frame.file_name(), "Telegram alert sent");
                    report.push(RecipientOutcome::delivered(recipient));
                }
                Err(e) => {
                    error!(%recipient, error = %e, "Telegram alert failed");
                    report.push(RecipientOutcome::failed(recipient, e.to_string()));
                }
            }
        }

        Ok(report)
    }
}
